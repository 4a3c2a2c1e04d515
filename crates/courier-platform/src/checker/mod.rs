// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-backed reachability checkers.
//!
//! A checker borrows the messenger session of one authorized sender number
//! attached to the campaign and asks the provider whether a recipient has an
//! account. Answers are memoized for a TTL; the orchestrator's cleanup timer
//! drops expired entries.

pub mod telegram;
pub mod waba;
pub mod whatsapp;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use courier_core::{
    CampaignRepository, CourierError, MessengerSession, Platform, PlatformChecker, SessionProvider,
    ban, phone,
};

use crate::retry::RetryPolicy;

pub use telegram::{Telegram, TelegramChecker};
pub use waba::{Waba, WabaChecker};
pub use whatsapp::{WhatsApp, WhatsAppChecker};

/// Platform-specific pieces of a [`SessionChecker`].
pub trait Dialect: Send + Sync + 'static {
    const PLATFORM: Platform;

    /// Whether a contact id returned by the provider's lookup means the
    /// number is registered on the platform.
    fn is_registered(contact_id: &str) -> bool {
        !contact_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedAnswer {
    reachable: bool,
    checked_at: Instant,
}

/// A [`PlatformChecker`] that resolves recipients through a messenger session.
pub struct SessionChecker<D> {
    sessions: Arc<dyn SessionProvider>,
    campaigns: Arc<dyn CampaignRepository>,
    session: RwLock<Option<Arc<dyn MessengerSession>>>,
    cache: DashMap<String, CachedAnswer>,
    policy: RetryPolicy,
    ttl: Duration,
    _dialect: PhantomData<fn() -> D>,
}

impl<D: Dialect> SessionChecker<D> {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        campaigns: Arc<dyn CampaignRepository>,
        policy: RetryPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            campaigns,
            session: RwLock::new(None),
            cache: DashMap::new(),
            policy,
            ttl,
            _dialect: PhantomData,
        }
    }

    /// Number of memoized answers, expired ones included.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.read().await.is_some()
    }

    fn cached(&self, recipient: &str) -> Option<bool> {
        self.cache
            .get(recipient)
            .filter(|answer| answer.checked_at.elapsed() < self.ttl)
            .map(|answer| answer.reachable)
    }

    async fn authorized_session(&self, sender: &str) -> Option<Arc<dyn MessengerSession>> {
        let session = match self.sessions.session(sender).await {
            Ok(session) => session,
            Err(e) => {
                warn!(platform = %D::PLATFORM, sender, error = %e, "cannot open checker session");
                return None;
            }
        };
        match session.is_authorized().await {
            Ok(true) => Some(session),
            Ok(false) => {
                debug!(platform = %D::PLATFORM, sender, "session not authorized, skipping");
                None
            }
            Err(e) => {
                warn!(platform = %D::PLATFORM, sender, error = %e, "authorization probe failed");
                None
            }
        }
    }
}

#[async_trait]
impl<D: Dialect> PlatformChecker for SessionChecker<D> {
    fn platform(&self) -> Platform {
        D::PLATFORM
    }

    async fn initialize(&self, campaign_id: Option<&str>) -> Result<(), CourierError> {
        if self.is_initialized().await {
            return Ok(());
        }
        let Some(campaign_id) = campaign_id else {
            return Err(CourierError::provider(format!(
                "{} checker needs a campaign to pick a session",
                D::PLATFORM
            )));
        };

        let attached = self.campaigns.get_campaign_phone_numbers(campaign_id).await?;
        for number in attached.iter().filter(|n| n.platform == D::PLATFORM) {
            if let Some(session) = self.authorized_session(&number.phone_number).await {
                *self.session.write().await = Some(session);
                info!(
                    platform = %D::PLATFORM,
                    campaign_id,
                    sender = %number.phone_number,
                    "checker initialized"
                );
                return Ok(());
            }
        }

        Err(CourierError::provider(format!(
            "no authorized {} session among numbers of campaign {campaign_id}",
            D::PLATFORM
        )))
    }

    async fn check(&self, phone_number: &str) -> Result<bool, CourierError> {
        let Ok(recipient) = phone::format_for(D::PLATFORM, phone_number) else {
            debug!(platform = %D::PLATFORM, phone_number, "malformed number, not reachable");
            return Ok(false);
        };
        if let Some(reachable) = self.cached(&recipient) {
            return Ok(reachable);
        }

        let session = self.session.read().await.clone().ok_or_else(|| {
            CourierError::provider(format!("{} checker is not initialized", D::PLATFORM))
        })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match session.lookup(&recipient).await {
                Ok(contact) => {
                    let reachable = contact.as_deref().is_some_and(D::is_registered);
                    self.cache.insert(
                        recipient,
                        CachedAnswer {
                            reachable,
                            checked_at: Instant::now(),
                        },
                    );
                    return Ok(reachable);
                }
                Err(e) if ban::classify(&e.to_string()).is_some() => return Err(e),
                Err(e) if attempt >= self.policy.attempts => return Err(e),
                Err(e) => {
                    warn!(
                        platform = %D::PLATFORM,
                        attempt,
                        error = %e,
                        "reachability lookup failed, retrying"
                    );
                    self.policy.pause_after(attempt).await;
                }
            }
        }
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        let session = self.session.write().await.take();
        if let Some(session) = session {
            session.disconnect().await?;
            debug!(platform = %D::PLATFORM, "checker session released");
        }
        Ok(())
    }

    async fn cleanup_cache(&self) {
        let before = self.cache.len();
        self.cache
            .retain(|_, answer| answer.checked_at.elapsed() < self.ttl);
        let purged = before.saturating_sub(self.cache.len());
        if purged > 0 {
            debug!(platform = %D::PLATFORM, purged, "expired reachability answers purged");
        }
    }
}
