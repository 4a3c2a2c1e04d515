// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides in-memory collaborators and a full-stack harness for fast,
//! deterministic tests without messenger accounts.
//!
//! # Components
//!
//! - [`InMemoryStore`] - every repository trait, with recorded write-backs
//! - [`MockSessionProvider`] - scripted messenger sessions with captured sends
//! - [`MockChecker`] - scripted platform checker
//! - [`RecordingNotifier`], [`ManualClock`]
//! - [`TestHarness`] - the real stack over temp SQLite and mock sessions

pub mod clock;
pub mod harness;
pub mod mock_checker;
pub mod mock_session;
pub mod notifier;
pub mod store;

pub use clock::ManualClock;
pub use harness::{NOTIFY_ID, OPERATOR, TestHarness};
pub use mock_checker::MockChecker;
pub use mock_session::{MockSession, MockSessionProvider, SentMessage};
pub use notifier::RecordingNotifier;
pub use store::{InMemoryStore, SavedDialog};
