// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reachability checking for the Courier distribution platform.
//!
//! - [`checker`]: session-backed [`PlatformChecker`](courier_core::PlatformChecker)
//!   implementations for Telegram, WhatsApp and WhatsApp Business.
//! - [`registry`]: the per-platform checker cache and its factories.
//! - [`messaging`]: the orchestrator that picks reachable platforms for a recipient.

pub mod checker;
pub mod messaging;
pub mod registry;
pub mod retry;

pub use checker::{
    Dialect, SessionChecker, TelegramChecker, WabaChecker, WhatsAppChecker,
};
pub use messaging::MessagingPlatformChecker;
pub use registry::{CheckerFactory, CheckerRegistry, SessionCheckerFactory};
pub use retry::RetryPolicy;
