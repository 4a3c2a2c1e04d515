// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ban classification of provider error messages.
//!
//! Provider errors arrive as free text. A closed set of tokens marks an error
//! as ban-related; everything else is treated as transient.

use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

use crate::types::{BanStatus, BanUpdate};

/// Ban tokens, most specific first: `RESTRICTED` is a suffix of `PRIVACY_RESTRICTED`.
const BAN_TOKENS: &[(&str, BanStatus)] = &[
    ("USER_DEACTIVATED", BanStatus::UserDeactivated),
    ("USER_BANNED", BanStatus::UserBanned),
    ("PRIVACY_RESTRICTED", BanStatus::PrivacyRestricted),
    ("FLOOD_WAIT", BanStatus::FloodWait),
    ("RESTRICTED", BanStatus::Restricted),
];

/// Longest flood wait honored as a timed ban. Longer requests are clamped.
pub const MAX_FLOOD_WAIT_SECS: u64 = 7 * 24 * 60 * 60;

static FLOOD_WAIT_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FLOOD_WAIT(?:_|:\s*|\s+)(\d+)").unwrap());

static PHONE_IN_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d{10,15}").unwrap());

/// Classify an error message. Returns `None` for non-ban errors.
pub fn classify(message: &str) -> Option<BanStatus> {
    let upper = message.to_ascii_uppercase();
    BAN_TOKENS
        .iter()
        .find(|(token, _)| upper.contains(token))
        .map(|(_, status)| *status)
}

/// Seconds requested by a `FLOOD_WAIT_<n>` / `FLOOD_WAIT: n` message.
pub fn flood_wait_seconds(message: &str) -> Option<u64> {
    let upper = message.to_ascii_uppercase();
    FLOOD_WAIT_SECONDS
        .captures(&upper)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Build the ban write-back for a message, if it is ban-classified.
///
/// Only flood waits with an explicit duration expire on their own. The wait
/// is capped at [`MAX_FLOOD_WAIT_SECS`].
pub fn ban_update(message: &str, now: DateTime<Utc>) -> Option<BanUpdate> {
    let status = classify(message)?;
    let expires_at = match status {
        BanStatus::FloodWait => flood_wait_seconds(message)
            .map(|secs| secs.min(MAX_FLOOD_WAIT_SECS))
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|wait| now.checked_add_signed(wait)),
        _ => None,
    };
    Some(BanUpdate { status, expires_at })
}

/// Extract the first phone-number-looking run of digits from a message.
pub fn extract_phone_number(message: &str) -> Option<String> {
    PHONE_IN_MESSAGE
        .find(message)
        .map(|m| m.as_str().to_string())
}
