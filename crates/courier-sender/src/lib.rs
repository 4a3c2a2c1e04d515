// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message senders for the Courier distribution platform.
//!
//! [`MessageSender`] performs single sends through the per-platform session
//! providers, reserving quota atomically and pacing each send through a
//! [`DelayStrategy`].

pub mod delay;
pub mod sender;

pub use delay::{DelayStrategy, NoDelay, RandomDelay};
pub use sender::MessageSender;
