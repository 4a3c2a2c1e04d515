// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messenger session provider traits.
//!
//! One provider exists per platform. The wire protocol lives entirely behind
//! these traits; Courier only asks for authorization state, contact lookup,
//! and message delivery.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{MessageId, Platform};

/// Creates or reuses the messenger session owned by a sender number.
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// The platform this provider speaks.
    fn platform(&self) -> Platform;

    /// Returns the session for `sender`, creating it on first use.
    async fn session(&self, sender: &str) -> Result<Arc<dyn MessengerSession>, CourierError>;
}

/// A live messenger session for one sender number.
#[async_trait]
pub trait MessengerSession: Send + Sync {
    /// Whether the session is logged in and able to send.
    async fn is_authorized(&self) -> Result<bool, CourierError>;

    /// Resolves a recipient (already formatted for the platform) to the
    /// provider's contact id. `Ok(None)` means the recipient has no account.
    async fn lookup(&self, recipient: &str) -> Result<Option<String>, CourierError>;

    /// Sends `text` to a resolved contact.
    async fn send_message(&self, contact_id: &str, text: &str) -> Result<MessageId, CourierError>;

    /// Closes the session.
    async fn disconnect(&self) -> Result<(), CourierError>;
}
