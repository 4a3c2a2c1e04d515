// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end distribution tests.
//!
//! `TestHarness` assembles the full stack over a temp SQLite database:
//! session-backed checkers and senders talking to [`MockSessionProvider`]s,
//! zero delays, zero bulk pacing and a [`RecordingNotifier`].

use std::collections::HashMap;
use std::sync::Arc;

use courier_config::CourierConfig;
use courier_config::model::{DelayConfig, StorageConfig};
use courier_core::{
    Campaign, CourierError, LeadStatus, PhoneNumberRepository, Platform, PlatformAccount,
    SenderPhoneNumber,
};
use courier_distribution::{MessageDistributionService, PhoneNumberManager};
use courier_platform::{
    CheckerRegistry, MessagingPlatformChecker, RetryPolicy, SessionCheckerFactory,
};
use courier_sender::{MessageSender, NoDelay};
use courier_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_session::MockSessionProvider;
use crate::notifier::RecordingNotifier;

/// Operator owning every harness campaign.
pub const OPERATOR: &str = "operator-1";
/// Telegram id receiving harness campaign notifications.
pub const NOTIFY_ID: i64 = 1001;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    platforms: Vec<Platform>,
    notifier: bool,
    config: CourierConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = CourierConfig::default();
        config.delays = DelayConfig::zero();
        config.distribution.bulk_pause_ms = 0;
        config.checker.backoff_secs = 0;
        Self {
            platforms: Platform::ALL.to_vec(),
            notifier: true,
            config,
        }
    }

    /// Register mock providers only for these platforms.
    pub fn with_platforms(mut self, platforms: &[Platform]) -> Self {
        self.platforms = platforms.to_vec();
        self
    }

    /// Leave the rotation manager without a notification sink.
    pub fn without_notifier(mut self) -> Self {
        self.notifier = false;
        self
    }

    /// Adjust the configuration before the stack is built.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut CourierConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CourierError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CourierError::Storage {
            source: Box::new(e),
        })?;
        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: temp_dir.path().join("test.db").display().to_string(),
            wal_mode: true,
        };

        let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
        let clock = Arc::new(ManualClock::default());

        let providers: HashMap<Platform, Arc<MockSessionProvider>> = self
            .platforms
            .iter()
            .map(|&p| (p, Arc::new(MockSessionProvider::new(p))))
            .collect();

        let policy = RetryPolicy::new(config.checker.attempts, config.checker.backoff());
        let mut factory =
            SessionCheckerFactory::new(storage.clone(), &config.checker).with_policy(policy);
        let mut sender = MessageSender::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            Arc::new(NoDelay),
            clock.clone(),
        );
        for provider in providers.values() {
            factory = factory.with_provider(provider.clone());
            sender = sender.with_session_provider(provider.clone());
        }

        let checker = Arc::new(
            MessagingPlatformChecker::new(
                Arc::new(CheckerRegistry::new(factory)),
                storage.clone(),
                storage.clone(),
                storage.clone(),
                clock.clone(),
                &config,
            )
            .with_policy(policy),
        );
        let rotation = Arc::new(PhoneNumberManager::new(
            storage.clone(),
            storage.clone(),
            clock.clone(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        if self.notifier {
            rotation.set_notifier(notifier.clone());
        }
        let service = Arc::new(MessageDistributionService::new(
            storage.clone(),
            checker,
            rotation,
            Arc::new(sender),
            clock.clone(),
            &config,
        ));

        Ok(TestHarness {
            storage,
            providers,
            notifier,
            clock,
            service,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete distribution stack over temp storage and mock sessions.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Mock session providers by platform.
    pub providers: HashMap<Platform, Arc<MockSessionProvider>>,
    /// Captures operator notifications.
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<MessageDistributionService>,
    pub config: CourierConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The mock provider for `platform`.
    ///
    /// # Panics
    ///
    /// If the harness was built without that platform.
    pub fn provider(&self, platform: Platform) -> &Arc<MockSessionProvider> {
        match self.providers.get(&platform) {
            Some(provider) => provider,
            None => panic!("harness has no {platform} provider"),
        }
    }

    /// Create an active campaign owned by [`OPERATOR`], notifying [`NOTIFY_ID`].
    pub async fn create_campaign(
        &self,
        id: &str,
        platform_priority: &str,
        message: Option<&str>,
    ) -> Result<(), CourierError> {
        self.storage
            .upsert_campaign(&Campaign {
                id: id.to_string(),
                user_id: OPERATOR.to_string(),
                message: message.map(str::to_string),
                platform_priority: platform_priority.to_string(),
                is_active: true,
                notification_telegram_ids: vec![NOTIFY_ID],
            })
            .await
    }

    /// Add (or extend) a sender number and attach it to the campaign.
    pub async fn add_sender(
        &self,
        campaign_id: &str,
        phone_number: &str,
        platform: Platform,
        daily_limit: u32,
        contacts_reached_today: u32,
    ) -> Result<(), CourierError> {
        let existing = self.storage.get_phone_number_info(phone_number).await?;
        let mut account = PlatformAccount::authenticated(daily_limit);
        account.contacts_reached_today = contacts_reached_today;
        let number = existing
            .unwrap_or_else(|| SenderPhoneNumber::new(phone_number))
            .with_account(platform, account);
        self.storage.upsert_phone_number(&number).await?;
        self.storage
            .attach_phone_number(campaign_id, phone_number, platform)
            .await
    }

    pub async fn account(
        &self,
        phone_number: &str,
        platform: Platform,
    ) -> Result<Option<PlatformAccount>, CourierError> {
        Ok(self
            .storage
            .get_phone_number_info(phone_number)
            .await?
            .and_then(|n| n.account(platform).cloned()))
    }

    pub async fn lead_status(&self, phone_number: &str) -> Result<Option<LeadStatus>, CourierError> {
        self.storage.get_lead_status(phone_number).await
    }
}
