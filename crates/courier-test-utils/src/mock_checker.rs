// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted platform checker.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use courier_core::{CourierError, Platform, PlatformChecker};

/// A checker answering from a script instead of a messenger session.
///
/// Every number is reachable (or unreachable) according to a global flag,
/// except those listed as unreachable. Queued failures are returned first.
pub struct MockChecker {
    platform: Platform,
    reachable: AtomicBool,
    fail_initialize: AtomicBool,
    unreachable: Mutex<HashSet<String>>,
    failures: Mutex<VecDeque<String>>,
    initialize_calls: AtomicUsize,
    check_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl MockChecker {
    pub fn reachable(platform: Platform) -> Self {
        Self {
            platform,
            reachable: AtomicBool::new(true),
            fail_initialize: AtomicBool::new(false),
            unreachable: Mutex::new(HashSet::new()),
            failures: Mutex::new(VecDeque::new()),
            initialize_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable(platform: Platform) -> Self {
        let checker = Self::reachable(platform);
        checker.set_reachable(false);
        checker
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_unreachable_number(&self, phone_number: &str) {
        self.unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(phone_number.to_string());
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    /// Fail the next checks with these provider messages, in order.
    pub fn fail_next<I, S>(&self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(messages.into_iter().map(Into::into));
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformChecker for MockChecker {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn initialize(&self, _campaign_id: Option<&str>) -> Result<(), CourierError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(CourierError::provider(format!(
                "{} session unavailable",
                self.platform
            )));
        }
        Ok(())
    }

    async fn check(&self, phone_number: &str) -> Result<bool, CourierError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(message) = failure {
            return Err(CourierError::provider(message));
        }
        let listed = self
            .unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(phone_number);
        Ok(!listed && self.reachable.load(Ordering::SeqCst))
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
