// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier distribution platform.
//!
//! Two families live here:
//! - [`CourierError`]: infrastructure faults and precondition violations. These
//!   are the only errors allowed to escape `distribute_message` / `bulk_distribute`.
//! - [`SendError`]: the structured outcome of a single send attempt. Senders
//!   always return these as values so batch distribution can continue.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type used across Courier traits and core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messenger provider errors surfaced by a session or checker.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The campaign does not exist.
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),

    /// The campaign has no message text to send.
    #[error("campaign {0} has no message to send")]
    EmptyMessage(String),

    /// The campaign has no sender numbers attached.
    #[error("campaign {0} has no attached phone numbers")]
    NoSenderNumbers(String),

    /// A phone number argument was empty or malformed.
    #[error("invalid phone number: {0:?}")]
    InvalidPhoneNumber(String),

    /// The platform token is unknown or no checker/session is registered for it.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        CourierError::Provider {
            message: message.into(),
            source: None,
        }
    }
}

/// Structured failure of a single send attempt.
///
/// The `Display` strings are the stable tokens the bot layer matches on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendError {
    /// The sender number exhausted its quota for this platform. Recoverable by rotation.
    #[error("DAILY_LIMIT_REACHED")]
    DailyLimitReached,

    /// No campaign id was supplied.
    #[error("CAMPAIGN_ID_UNDEFINED")]
    CampaignIdUndefined,

    /// The campaign could not be resolved to an owning user.
    #[error("CAMPAIGN_NOT_FOUND")]
    CampaignNotFound,

    /// The sender's messenger session is not logged in.
    #[error("CLIENT_NOT_AUTHORIZED")]
    ClientNotAuthorized,

    /// The recipient has no account on the platform.
    #[error("RECIPIENT_NOT_FOUND")]
    RecipientNotFound,

    /// The provider asked us to back off.
    #[error("FLOOD_WAIT: {seconds}s")]
    FloodWait { seconds: u64 },

    /// Any other provider or storage failure, carried as text.
    #[error("{0}")]
    Provider(String),
}

impl SendError {
    /// Whether rotating to another sender number may fix this failure.
    pub fn triggers_rotation(&self) -> bool {
        matches!(self, SendError::DailyLimitReached)
    }
}
