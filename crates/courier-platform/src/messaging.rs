// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform selection for one recipient.
//!
//! `MessagingPlatformChecker` lazily initializes the checkers named by a
//! campaign's platform priority, runs reachability checks with bounded
//! retries, writes ban-classified failures back to the phone-number
//! repository, and marks leads unreachable on every platform as unavailable.
//!
//! Per campaign the checker moves `uninitialized -> ready` once every member
//! of its priority has been initialized; an hourly timer then purges expired
//! reachability answers until [`MessagingPlatformChecker::shutdown`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_config::CourierConfig;
use courier_core::{
    CampaignRepository, CheckMode, Clock, CourierError, LeadService, PhoneNumberRepository,
    Platform, PlatformChecker, PlatformSet, ban, phone,
};

use crate::registry::CheckerRegistry;
use crate::retry::RetryPolicy;

struct CleanupTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Orchestrates per-platform checkers for the distribution service.
pub struct MessagingPlatformChecker {
    registry: Arc<CheckerRegistry>,
    campaigns: Arc<dyn CampaignRepository>,
    phones: Arc<dyn PhoneNumberRepository>,
    leads: Arc<dyn LeadService>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    default_priority: PlatformSet,
    cleanup_interval: Duration,
    initialized: DashMap<String, HashSet<Platform>>,
    cleanup: Mutex<Option<CleanupTask>>,
}

impl MessagingPlatformChecker {
    pub fn new(
        registry: Arc<CheckerRegistry>,
        campaigns: Arc<dyn CampaignRepository>,
        phones: Arc<dyn PhoneNumberRepository>,
        leads: Arc<dyn LeadService>,
        clock: Arc<dyn Clock>,
        config: &CourierConfig,
    ) -> Self {
        let default_priority = PlatformSet::parse_token(&config.distribution.default_platform)
            .unwrap_or_else(|| {
                warn!(
                    token = %config.distribution.default_platform,
                    "invalid default platform, using telegram"
                );
                PlatformSet::Single(Platform::Telegram)
            });
        Self {
            registry,
            campaigns,
            phones,
            leads,
            clock,
            policy: RetryPolicy::from_config(&config.checker),
            default_priority,
            cleanup_interval: config.checker.cleanup_interval(),
            initialized: DashMap::new(),
            cleanup: Mutex::new(None),
        }
    }

    /// Replace the retry policy used around checker calls.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<CheckerRegistry> {
        &self.registry
    }

    /// Whether `platform` has been initialized for `campaign_id`.
    pub fn is_initialized(&self, campaign_id: &str, platform: Platform) -> bool {
        self.initialized
            .get(campaign_id)
            .is_some_and(|ready| ready.contains(&platform))
    }

    pub fn cleanup_timer_running(&self) -> bool {
        self.cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Initialize the checkers named by the campaign's stored priority.
    ///
    /// Idempotent. Returns the platforms that are ready.
    pub async fn initialize(&self, campaign_id: &str) -> Result<Vec<Platform>, CourierError> {
        let priority = self.resolve_priority(campaign_id, None).await?;
        self.ensure_initialized(campaign_id, priority).await
    }

    /// Initialize every member of `set` not yet ready for `campaign_id`.
    ///
    /// Members whose checker fails to initialize are skipped with a warning;
    /// the call fails only when no member is ready.
    pub async fn ensure_initialized(
        &self,
        campaign_id: &str,
        set: PlatformSet,
    ) -> Result<Vec<Platform>, CourierError> {
        let mut ready = Vec::new();
        let mut last_error = None;

        for platform in set.members() {
            if self.is_initialized(campaign_id, platform) {
                ready.push(platform);
                continue;
            }
            let checker = self.registry.checker(platform)?;
            match checker.initialize(Some(campaign_id)).await {
                Ok(()) => {
                    self.initialized
                        .entry(campaign_id.to_string())
                        .or_default()
                        .insert(platform);
                    info!(campaign_id, %platform, "platform ready");
                    ready.push(platform);
                }
                Err(e) => {
                    warn!(campaign_id, %platform, error = %e, "platform initialization failed");
                    last_error = Some(e);
                }
            }
        }

        match (ready.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => {
                self.ensure_cleanup_timer();
                Ok(ready)
            }
        }
    }

    /// Pick the platforms on which `phone_number` is reachable.
    ///
    /// `platform_priority` wins when it is a valid token; otherwise the
    /// campaign's stored priority applies, then the configured default.
    /// An empty result means the recipient is unreachable and the lead has
    /// been marked unavailable.
    pub async fn choose_platform(
        &self,
        campaign_id: &str,
        phone_number: &str,
        platform_priority: Option<&str>,
        mode: CheckMode,
    ) -> Result<Vec<Platform>, CourierError> {
        let recipient = phone::normalize(phone_number)?;
        let priority = self.resolve_priority(campaign_id, platform_priority).await?;
        let ready = self.ensure_initialized(campaign_id, priority).await?;
        debug!(campaign_id, %recipient, %priority, %mode, "choosing platform");
        self.check_platforms(&recipient, &ready, mode).await
    }

    /// Check each platform in order and return the reachable ones.
    ///
    /// `mode` is recorded in the logs only; every listed platform is checked.
    pub async fn check_platforms(
        &self,
        phone_number: &str,
        platforms: &[Platform],
        mode: CheckMode,
    ) -> Result<Vec<Platform>, CourierError> {
        let mut reachable = Vec::with_capacity(platforms.len());
        for &platform in platforms {
            let checker = self.registry.checker(platform)?;
            if self.check_with_retry(checker.as_ref(), phone_number).await {
                reachable.push(platform);
            }
        }

        if reachable.is_empty() {
            info!(recipient = %phone_number, %mode, "recipient unreachable on every platform");
            if let Err(e) = self.leads.set_lead_unavailable(phone_number).await {
                warn!(recipient = %phone_number, error = %e, "failed to mark lead unavailable");
            }
        } else {
            debug!(recipient = %phone_number, ?reachable, %mode, "recipient reachable");
        }
        Ok(reachable)
    }

    /// Stop the cleanup timer and disconnect every checker.
    pub async fn shutdown(&self) {
        let task = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                warn!(error = %e, "cache cleanup task ended abnormally");
            }
        }
        self.registry.disconnect_all().await;
        self.initialized.clear();
        info!("platform checkers shut down");
    }

    async fn resolve_priority(
        &self,
        campaign_id: &str,
        requested: Option<&str>,
    ) -> Result<PlatformSet, CourierError> {
        if let Some(raw) = requested {
            match PlatformSet::parse_token(raw) {
                Some(set) => return Ok(set),
                None => debug!(campaign_id, token = raw, "ignoring invalid platform priority"),
            }
        }

        let stored = self.campaigns.get_platform_priority(campaign_id).await?;
        match stored.as_deref().and_then(PlatformSet::parse_token) {
            Some(set) => Ok(set),
            None => {
                warn!(
                    campaign_id,
                    stored = ?stored,
                    default = %self.default_priority,
                    "campaign has no valid platform priority, using default"
                );
                Ok(self.default_priority)
            }
        }
    }

    async fn check_with_retry(&self, checker: &dyn PlatformChecker, phone_number: &str) -> bool {
        let platform = checker.platform();
        for attempt in 1..=self.policy.attempts {
            match checker.check(phone_number).await {
                Ok(reachable) => return reachable,
                Err(e) => {
                    let message = e.to_string();
                    if let Some(update) = ban::ban_update(&message, self.clock.now()) {
                        let banned = ban::extract_phone_number(&message)
                            .and_then(|raw| phone::normalize(&raw).ok())
                            .unwrap_or_else(|| phone_number.to_string());
                        warn!(
                            %platform,
                            phone_number = %banned,
                            status = %update.status,
                            "ban detected during check"
                        );
                        if let Err(e) = self
                            .phones
                            .update_phone_number_ban_status(&banned, &update)
                            .await
                        {
                            warn!(phone_number = %banned, error = %e, "failed to record ban");
                        }
                        return false;
                    }
                    warn!(%platform, attempt, error = %message, "platform check failed");
                    self.policy.pause_after(attempt).await;
                }
            }
        }
        false
    }

    fn ensure_cleanup_timer(&self) {
        let mut slot = self.cleanup.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return;
        }

        let registry = self.registry.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let every = self.cleanup_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick fires immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        for checker in registry.built() {
                            checker.cleanup_cache().await;
                        }
                        debug!("checker caches swept");
                    }
                    _ = token.cancelled() => {
                        debug!("cache cleanup timer stopped");
                        break;
                    }
                }
            }
        });
        *slot = Some(CleanupTask { cancel, handle });
    }
}

impl Drop for MessagingPlatformChecker {
    fn drop(&mut self) {
        if let Some(task) = self
            .cleanup
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.cancel.cancel();
        }
    }
}
