// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business reachability through the Cloud API contacts endpoint.

use courier_core::Platform;

use super::{Dialect, SessionChecker};

pub struct Waba;

impl Dialect for Waba {
    const PLATFORM: Platform = Platform::Waba;
}

pub type WabaChecker = SessionChecker<Waba>;
