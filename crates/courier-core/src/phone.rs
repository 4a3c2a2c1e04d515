// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization and per-platform formatting.
//!
//! Everything inside Courier stores numbers as `+<digits>` (E.164-like, 10 to 15
//! digits). Providers want different shapes:
//! - Telegram: `+15551234567`
//! - WhatsApp Web: `15551234567@c.us`
//! - WhatsApp Business API: `15551234567`

use crate::error::CourierError;
use crate::types::Platform;

const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// Normalize a raw phone number to `+<digits>`.
///
/// Spaces, dashes, dots and parentheses are stripped; a leading `00` is
/// treated as an international prefix. Anything else is rejected.
pub fn normalize(raw: &str) -> Result<String, CourierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CourierError::InvalidPhoneNumber(raw.to_string()));
    }

    let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = String::with_capacity(without_plus.len());
    for c in without_plus.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(CourierError::InvalidPhoneNumber(raw.to_string())),
        }
    }

    let digits = match digits.strip_prefix("00") {
        Some(rest) if !trimmed.starts_with('+') => rest.to_string(),
        _ => digits,
    };

    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) || digits.starts_with('0') {
        return Err(CourierError::InvalidPhoneNumber(raw.to_string()));
    }

    Ok(format!("+{digits}"))
}

/// Normalized number without the leading `+`.
pub fn digits(raw: &str) -> Result<String, CourierError> {
    normalize(raw).map(|n| n[1..].to_string())
}

/// Format a number the way `platform`'s provider expects it.
pub fn format_for(platform: Platform, raw: &str) -> Result<String, CourierError> {
    match platform {
        Platform::Telegram => normalize(raw),
        Platform::WhatsApp => digits(raw).map(|d| format!("{d}@c.us")),
        Platform::Waba => digits(raw),
    }
}
