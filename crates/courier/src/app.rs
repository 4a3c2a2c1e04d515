// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the distribution stack from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use courier_config::CourierConfig;
use courier_core::{Clock, CourierError, Platform, SessionProvider, SystemClock};
use courier_distribution::{MessageDistributionService, PhoneNumberManager};
use courier_platform::{CheckerRegistry, MessagingPlatformChecker, SessionCheckerFactory};
use courier_sender::{MessageSender, RandomDelay};
use courier_storage::SqliteStorage;
use courier_waba::WabaSessionProvider;

use crate::notify::TelegramNotifier;

/// The storage handle and distribution service for one CLI invocation.
pub struct App {
    pub storage: Arc<SqliteStorage>,
    pub service: MessageDistributionService,
    /// Platforms with a registered session provider.
    pub platforms: Vec<Platform>,
}

impl App {
    /// Opens storage and assembles checkers, senders and rotation.
    ///
    /// Only the WABA provider ships with the binary; it is registered when
    /// an access token is configured.
    pub async fn build(config: &CourierConfig) -> Result<Self, CourierError> {
        let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let mut factory = SessionCheckerFactory::new(storage.clone(), &config.checker);
        let mut sender = MessageSender::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            Arc::new(RandomDelay::new(config.delays.clone())),
            clock.clone(),
        );
        if config.waba.access_token.is_some() {
            let waba: Arc<dyn SessionProvider> =
                Arc::new(WabaSessionProvider::from_config(&config.waba)?);
            factory = factory.with_provider(waba.clone());
            sender = sender.with_session_provider(waba);
        } else {
            warn!("waba.access_token not set, no messenger provider registered");
        }
        let platforms = factory.platforms();

        let checker = Arc::new(MessagingPlatformChecker::new(
            Arc::new(CheckerRegistry::new(factory)),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            clock.clone(),
            config,
        ));
        let rotation = Arc::new(PhoneNumberManager::new(
            storage.clone(),
            storage.clone(),
            clock.clone(),
        ));
        match config.notifications.telegram_bot_token.as_deref() {
            Some(token) => rotation.set_notifier(Arc::new(TelegramNotifier::new(token))),
            None => info!("notifications.telegram_bot_token not set, notifications are logged only"),
        }

        courier_distribution::metrics::register_metrics();
        let service = MessageDistributionService::new(
            storage.clone(),
            checker,
            rotation,
            Arc::new(sender),
            clock,
            config,
        );
        Ok(Self {
            storage,
            service,
            platforms,
        })
    }

    pub async fn shutdown(self) -> Result<(), CourierError> {
        self.service.shutdown().await;
        drop(self.service);
        match Arc::try_unwrap(self.storage) {
            Ok(storage) => storage.close().await,
            Err(_) => Ok(()),
        }
    }
}
