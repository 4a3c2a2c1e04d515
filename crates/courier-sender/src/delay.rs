// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inter-send pacing.
//!
//! Messengers flag accounts that send at machine-regular intervals, so every
//! send waits a random time drawn from the platform's configured window.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use courier_config::model::DelayConfig;
use courier_core::Platform;

/// Decides how long to wait before a send on `platform`.
#[async_trait]
pub trait DelayStrategy: Send + Sync + 'static {
    /// The pause to apply before the next send.
    fn next_delay(&self, platform: Platform) -> Duration;

    async fn pause(&self, platform: Platform) {
        let delay = self.next_delay(platform);
        if !delay.is_zero() {
            debug!(%platform, delay_ms = delay.as_millis() as u64, "pacing send");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Uniformly random delay within the configured per-platform bounds.
#[derive(Debug, Clone)]
pub struct RandomDelay {
    bounds: DelayConfig,
}

impl RandomDelay {
    pub fn new(bounds: DelayConfig) -> Self {
        Self { bounds }
    }
}

#[async_trait]
impl DelayStrategy for RandomDelay {
    fn next_delay(&self, platform: Platform) -> Duration {
        let (min, max) = self.bounds.bounds(platform);
        if max <= min {
            return Duration::from_secs(min);
        }
        let millis = rand::thread_rng().gen_range(min * 1000..=max * 1000);
        Duration::from_millis(millis)
    }
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl DelayStrategy for NoDelay {
    fn next_delay(&self, _platform: Platform) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_delay_stays_within_bounds() {
        let delay = RandomDelay::new(DelayConfig::default());
        for _ in 0..200 {
            let tg = delay.next_delay(Platform::Telegram);
            assert!(tg >= Duration::from_secs(10) && tg <= Duration::from_secs(60));
            let wa = delay.next_delay(Platform::WhatsApp);
            assert!(wa >= Duration::from_secs(30) && wa <= Duration::from_secs(300));
        }
    }

    #[test]
    fn degenerate_window_is_fixed() {
        let delay = RandomDelay::new(DelayConfig::zero());
        assert_eq!(delay.next_delay(Platform::Waba), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_the_drawn_delay() {
        let mut bounds = DelayConfig::zero();
        bounds.telegram_min_secs = 10;
        bounds.telegram_max_secs = 10;
        let start = tokio::time::Instant::now();
        RandomDelay::new(bounds).pause(Platform::Telegram).await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
