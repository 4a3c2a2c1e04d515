// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-(lead, operator) reply throttle.
//!
//! Inbound events for the same lead often arrive in bursts; only the first
//! one inside the window produces an automatic reply.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use courier_core::Clock;

pub struct RateLimiter {
    window: TimeDelta,
    clock: Arc<dyn Clock>,
    last_reply: DashMap<(String, String), DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            clock,
            last_reply: DashMap::new(),
        }
    }

    /// Claim the reply slot for `(lead_phone, user_id)`.
    ///
    /// Returns `false` while a previous claim is younger than the window.
    pub fn try_acquire(&self, lead_phone: &str, user_id: &str) -> bool {
        let now = self.clock.now();
        match self
            .last_reply
            .entry((lead_phone.to_string(), user_id.to_string()))
        {
            Entry::Occupied(mut last) => {
                if now - *last.get() < self.window {
                    return false;
                }
                last.insert(now);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    /// Drop claims older than the window. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.last_reply.len();
        self.last_reply.retain(|_, last| now - *last < self.window);
        before.saturating_sub(self.last_reply.len())
    }

    pub fn len(&self) -> usize {
        self.last_reply.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_reply.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_test_utils::ManualClock;

    #[test]
    fn second_claim_inside_window_is_refused() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(Duration::from_secs(60), clock.clone());
        assert!(limiter.try_acquire("+15551234567", "op"));
        assert!(!limiter.try_acquire("+15551234567", "op"));
        // Other operator, other lead: independent slots.
        assert!(limiter.try_acquire("+15551234567", "op2"));
        assert!(limiter.try_acquire("+15551234568", "op"));

        clock.advance(TimeDelta::seconds(59));
        assert!(!limiter.try_acquire("+15551234567", "op"));
        clock.advance(TimeDelta::seconds(1));
        assert!(limiter.try_acquire("+15551234567", "op"));
    }

    #[test]
    fn purge_drops_only_expired_claims() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(Duration::from_secs(60), clock.clone());
        limiter.try_acquire("+15551234567", "op");
        clock.advance(TimeDelta::seconds(45));
        limiter.try_acquire("+15551234568", "op");
        clock.advance(TimeDelta::seconds(20));
        assert_eq!(limiter.purge_expired(), 1);
        assert_eq!(limiter.len(), 1);
    }
}
