// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender number rotation.
//!
//! Each (campaign, platform) pair has a pinned sender number. The pin starts
//! at the first available attached number and stays until that number becomes
//! unavailable; [`PhoneNumberManager::switch_to_next_phone_number`] then walks
//! the attached numbers as a ring, starting after the current one.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use courier_core::{
    CampaignRepository, Clock, CourierError, NotificationSink, PhoneNumberRepository, Platform,
};

use crate::metrics;

pub struct PhoneNumberManager {
    campaigns: Arc<dyn CampaignRepository>,
    phones: Arc<dyn PhoneNumberRepository>,
    clock: Arc<dyn Clock>,
    notifier: RwLock<Option<Arc<dyn NotificationSink>>>,
    pinned: DashMap<(String, Platform), String>,
}

impl PhoneNumberManager {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        phones: Arc<dyn PhoneNumberRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            campaigns,
            phones,
            clock,
            notifier: RwLock::new(None),
            pinned: DashMap::new(),
        }
    }

    /// Install the sink for operator notifications.
    ///
    /// Without one, switch and exhaustion events are only logged.
    pub fn set_notifier(&self, notifier: Arc<dyn NotificationSink>) {
        *self.notifier.write().unwrap_or_else(PoisonError::into_inner) = Some(notifier);
    }

    /// The currently pinned sender for `(campaign_id, platform)`.
    pub fn active_sender(&self, campaign_id: &str, platform: Platform) -> Option<String> {
        self.pinned
            .get(&(campaign_id.to_string(), platform))
            .map(|pin| pin.value().clone())
    }

    /// Whether `phone_number` can send on `platform` right now: known, not
    /// banned, authenticated on the platform, and under its daily limit.
    pub async fn is_phone_number_available(
        &self,
        phone_number: &str,
        platform: Platform,
    ) -> Result<bool, CourierError> {
        let info = self.phones.get_phone_number_info(phone_number).await?;
        Ok(info.is_some_and(|number| number.is_available_on(platform, self.clock.now())))
    }

    /// The sender to use for the next send, or `None` if no attached number
    /// is available.
    ///
    /// A pin that moves off a sender which became unavailable is announced
    /// to operators like a switch.
    pub async fn get_next_available_phone_number(
        &self,
        campaign_id: &str,
        platform: Platform,
    ) -> Result<Option<String>, CourierError> {
        let attached = self.attached(campaign_id, platform).await?;
        let key = (campaign_id.to_string(), platform);

        let pinned = self.pinned.get(&key).map(|pin| pin.value().clone());
        if let Some(pinned) = &pinned {
            if attached.contains(pinned) && self.is_phone_number_available(pinned, platform).await? {
                return Ok(Some(pinned.clone()));
            }
        }

        for candidate in &attached {
            if self.is_phone_number_available(candidate, platform).await? {
                debug!(campaign_id, %platform, sender = %candidate, "sender pinned");
                self.pinned.insert(key, candidate.clone());
                if let Some(previous) = &pinned {
                    self.announce_switch(campaign_id, platform, previous, candidate)
                        .await;
                }
                return Ok(Some(candidate.clone()));
            }
        }

        self.pinned.remove(&key);
        if let Some(previous) = &pinned {
            self.announce_exhaustion(campaign_id, platform, previous).await;
        }
        Ok(None)
    }

    /// Move off `current` to the next available attached number.
    ///
    /// Numbers after `current` in attach order are tried first, wrapping
    /// around. `current` itself is only returned when it is the sole
    /// available number. Notifies the campaign's operators of the switch, or
    /// of exhaustion when `None` is returned.
    pub async fn switch_to_next_phone_number(
        &self,
        campaign_id: &str,
        current: &str,
        platform: Platform,
    ) -> Result<Option<String>, CourierError> {
        let attached = self.attached(campaign_id, platform).await?;
        let key = (campaign_id.to_string(), platform);
        let start = attached
            .iter()
            .position(|n| n == current)
            .map_or(0, |i| i + 1);

        let ring = attached
            .iter()
            .cycle()
            .skip(start)
            .take(attached.len())
            .filter(|n| n.as_str() != current);
        for candidate in ring {
            if self.is_phone_number_available(candidate, platform).await? {
                self.pinned.insert(key, candidate.clone());
                self.announce_switch(campaign_id, platform, current, candidate)
                    .await;
                return Ok(Some(candidate.clone()));
            }
        }

        if attached.iter().any(|n| n == current)
            && self.is_phone_number_available(current, platform).await?
        {
            debug!(campaign_id, %platform, sender = current, "no other sender, keeping current");
            self.pinned.insert(key, current.to_string());
            return Ok(Some(current.to_string()));
        }

        self.pinned.remove(&key);
        self.announce_exhaustion(campaign_id, platform, current).await;
        Ok(None)
    }

    async fn announce_switch(&self, campaign_id: &str, platform: Platform, from: &str, to: &str) {
        metrics::record_rotation(platform, true);
        info!(campaign_id, %platform, from, to, "sender switched");
        self.notify(
            campaign_id,
            &format!("Campaign {campaign_id}: {platform} sender switched from {from} to {to}."),
        )
        .await;
    }

    async fn announce_exhaustion(&self, campaign_id: &str, platform: Platform, last: &str) {
        metrics::record_rotation(platform, false);
        warn!(campaign_id, %platform, last, "no available sender numbers left");
        self.notify(
            campaign_id,
            &format!("Campaign {campaign_id}: no available {platform} numbers left (last used {last})."),
        )
        .await;
    }

    async fn attached(
        &self,
        campaign_id: &str,
        platform: Platform,
    ) -> Result<Vec<String>, CourierError> {
        Ok(self
            .campaigns
            .get_campaign_phone_numbers(campaign_id)
            .await?
            .into_iter()
            .filter(|n| n.platform == platform)
            .map(|n| n.phone_number)
            .collect())
    }

    async fn notify(&self, campaign_id: &str, message: &str) {
        let notifier = self
            .notifier
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(notifier) = notifier else {
            info!(campaign_id, notification = message, "no notifier configured, notification logged only");
            return;
        };

        let recipients = match self.campaigns.get_campaign_by_id(campaign_id).await {
            Ok(Some(campaign)) => campaign.notification_telegram_ids,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(campaign_id, error = %e, "cannot load notification recipients");
                return;
            }
        };
        if recipients.is_empty() {
            debug!(campaign_id, "campaign has no notification recipients");
        }
        for telegram_id in recipients {
            if let Err(e) = notifier.notify(telegram_id, message).await {
                warn!(campaign_id, telegram_id, error = %e, "notification delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{Campaign, CampaignPhoneNumber, PlatformAccount, SenderPhoneNumber};
    use courier_test_utils::{InMemoryStore, ManualClock, RecordingNotifier};
    use tracing_test::traced_test;

    const A: &str = "+15550000001";
    const B: &str = "+15550000002";
    const C: &str = "+15550000003";

    async fn store_with(numbers: &[(&str, u32, u32)]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .add_campaign(Campaign {
                id: "c1".into(),
                user_id: "op".into(),
                message: Some("hi".into()),
                platform_priority: "telegram".into(),
                is_active: true,
                notification_telegram_ids: vec![42],
            })
            .await;
        for &(phone, limit, reached) in numbers {
            let mut account = PlatformAccount::authenticated(limit);
            account.contacts_reached_today = reached;
            store
                .add_phone_number(SenderPhoneNumber::new(phone).with_account(Platform::Telegram, account))
                .await;
            store
                .attach("c1", CampaignPhoneNumber {
                    phone_number: phone.into(),
                    platform: Platform::Telegram,
                })
                .await;
        }
        store
    }

    fn manager(store: &Arc<InMemoryStore>) -> PhoneNumberManager {
        PhoneNumberManager::new(store.clone(), store.clone(), Arc::new(ManualClock::default()))
    }

    #[tokio::test]
    async fn first_available_number_is_pinned() {
        let store = store_with(&[(A, 1, 1), (B, 5, 0), (C, 5, 0)]).await;
        let m = manager(&store);
        assert_eq!(
            m.get_next_available_phone_number("c1", Platform::Telegram).await.unwrap(),
            Some(B.to_string())
        );
        assert_eq!(m.active_sender("c1", Platform::Telegram), Some(B.to_string()));
        assert_eq!(
            m.get_next_available_phone_number("c1", Platform::Telegram).await.unwrap(),
            Some(B.to_string())
        );
        assert!(
            m.get_next_available_phone_number("c1", Platform::WhatsApp)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn switch_walks_the_ring_after_current() {
        let store = store_with(&[(A, 5, 0), (B, 5, 0), (C, 5, 0)]).await;
        let m = manager(&store);
        let notifier = Arc::new(RecordingNotifier::new());
        m.set_notifier(notifier.clone());

        let next = m.switch_to_next_phone_number("c1", B, Platform::Telegram).await.unwrap();
        assert_eq!(next, Some(C.to_string()));
        let next = m.switch_to_next_phone_number("c1", C, Platform::Telegram).await.unwrap();
        assert_eq!(next, Some(A.to_string()));
        assert_eq!(m.active_sender("c1", Platform::Telegram), Some(A.to_string()));

        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, 42);
        assert!(sent[0].1.contains(B) && sent[0].1.contains(C));
    }

    #[tokio::test]
    async fn pin_moving_off_exhausted_sender_is_announced() {
        let store = store_with(&[(A, 1, 0), (B, 5, 0)]).await;
        let m = manager(&store);
        let notifier = Arc::new(RecordingNotifier::new());
        m.set_notifier(notifier.clone());

        let first = m.get_next_available_phone_number("c1", Platform::Telegram).await.unwrap();
        assert_eq!(first, Some(A.to_string()));
        assert!(store.reserve_send(A, Platform::Telegram, true).await.unwrap());

        let next = m.get_next_available_phone_number("c1", Platform::Telegram).await.unwrap();
        assert_eq!(next, Some(B.to_string()));
        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("switched from +15550000001 to +15550000002"));
    }

    #[tokio::test]
    async fn sole_available_number_is_kept() {
        let store = store_with(&[(A, 5, 0), (B, 1, 1)]).await;
        let m = manager(&store);
        let next = m.switch_to_next_phone_number("c1", A, Platform::Telegram).await.unwrap();
        assert_eq!(next, Some(A.to_string()));
    }

    #[tokio::test]
    async fn exhaustion_notifies_and_unpins() {
        let store = store_with(&[(A, 1, 1), (B, 1, 1)]).await;
        let m = manager(&store);
        let notifier = Arc::new(RecordingNotifier::new());
        m.set_notifier(notifier.clone());

        let next = m.switch_to_next_phone_number("c1", A, Platform::Telegram).await.unwrap();
        assert_eq!(next, None);
        assert_eq!(m.active_sender("c1", Platform::Telegram), None);
        let sent = notifier.notifications().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("no available telegram numbers"));
    }

    #[tokio::test]
    async fn banned_and_unauthenticated_numbers_are_skipped() {
        let store = store_with(&[(A, 5, 0)]).await;
        let mut banned = SenderPhoneNumber::new(B)
            .with_account(Platform::Telegram, PlatformAccount::authenticated(5));
        banned.is_banned = true;
        store.add_phone_number(banned).await;
        let mut logged_out = PlatformAccount::authenticated(5);
        logged_out.is_authenticated = false;
        store
            .add_phone_number(SenderPhoneNumber::new(C).with_account(Platform::Telegram, logged_out))
            .await;
        for phone in [B, C] {
            store
                .attach("c1", CampaignPhoneNumber {
                    phone_number: phone.into(),
                    platform: Platform::Telegram,
                })
                .await;
        }

        let m = manager(&store);
        assert!(!m.is_phone_number_available(B, Platform::Telegram).await.unwrap());
        assert!(!m.is_phone_number_available(C, Platform::Telegram).await.unwrap());
        assert!(!m.is_phone_number_available("+15559999999", Platform::Telegram).await.unwrap());
        assert_eq!(
            m.switch_to_next_phone_number("c1", A, Platform::Telegram).await.unwrap(),
            Some(A.to_string())
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn without_notifier_events_are_only_logged() {
        let store = store_with(&[(A, 1, 1)]).await;
        let m = manager(&store);
        let next = m.switch_to_next_phone_number("c1", A, Platform::Telegram).await.unwrap();
        assert_eq!(next, None);
        assert!(logs_contain("no notifier configured"));
    }
}
