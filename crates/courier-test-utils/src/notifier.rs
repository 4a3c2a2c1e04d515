// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sink that records everything it is asked to deliver.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{CourierError, NotificationSink};

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(telegram_id, message)` delivered so far.
    pub async fn notifications(&self) -> Vec<(i64, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, telegram_id: i64, message: &str) -> Result<(), CourierError> {
        self.sent.lock().await.push((telegram_id, message.to_string()));
        Ok(())
    }
}
