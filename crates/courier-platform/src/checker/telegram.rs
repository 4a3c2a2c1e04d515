// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram reachability: an MTProto contact import resolving to a user id.

use courier_core::Platform;

use super::{Dialect, SessionChecker};

pub struct Telegram;

impl Dialect for Telegram {
    const PLATFORM: Platform = Platform::Telegram;
}

pub type TelegramChecker = SessionChecker<Telegram>;
