// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notification sink, provided by the hosting bot layer.

use async_trait::async_trait;

use crate::error::CourierError;

/// Delivers a text notification to an operator's Telegram chat.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn notify(&self, telegram_id: i64, message: &str) -> Result<(), CourierError>;
}
