// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notifications through the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::debug;

use courier_core::{CourierError, NotificationSink};

/// Sends rotation notifications as plain-text bot messages.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, telegram_id: i64, message: &str) -> Result<(), CourierError> {
        self.bot
            .send_message(ChatId(telegram_id), message)
            .await
            .map_err(|e| CourierError::Provider {
                message: format!("telegram notification failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(telegram_id, "operator notified");
        Ok(())
    }
}
