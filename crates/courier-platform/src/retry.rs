// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded fixed-backoff retry policy shared by checkers and the orchestrator.

use std::time::Duration;

use courier_config::model::CheckerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub attempts: u32,
    /// Pause between two attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// `attempts` tries with no pause in between.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(config.attempts, config.backoff())
    }

    /// Sleep before attempt `attempt + 1`, unless `attempt` was the last one.
    pub(crate) async fn pause_after(&self, attempt: u32) {
        if attempt < self.attempts && !self.backoff.is_zero() {
            tokio::time::sleep(self.backoff).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CheckerConfig::default())
    }
}
