// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Web reachability.
//!
//! The web client resolves registered numbers to a `<digits>@c.us` chat id.
//! Anything else (group ids, lid ids, empty strings) is not a reachable user.

use courier_core::Platform;

use super::{Dialect, SessionChecker};

pub struct WhatsApp;

impl Dialect for WhatsApp {
    const PLATFORM: Platform = Platform::WhatsApp;

    fn is_registered(contact_id: &str) -> bool {
        contact_id
            .strip_suffix("@c.us")
            .is_some_and(|user| !user.is_empty() && user.chars().all(|c| c.is_ascii_digit()))
    }
}

pub type WhatsAppChecker = SessionChecker<WhatsApp>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_user_chat_ids_count() {
        assert!(WhatsApp::is_registered("15551234567@c.us"));
        assert!(!WhatsApp::is_registered("@c.us"));
        assert!(!WhatsApp::is_registered("120363@g.us"));
        assert!(!WhatsApp::is_registered("15551234567"));
    }
}
