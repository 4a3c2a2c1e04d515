// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reachability checker trait, one implementation per platform.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::Platform;

/// Answers "is this number reachable on platform X?".
///
/// Checkers make external API calls only; they never write to storage.
#[async_trait]
pub trait PlatformChecker: Send + Sync + 'static {
    /// The platform this checker answers for.
    fn platform(&self) -> Platform;

    /// Prepares whatever session the checker needs. Idempotent.
    async fn initialize(&self, campaign_id: Option<&str>) -> Result<(), CourierError>;

    /// Whether `phone_number` has an account on the platform.
    ///
    /// Malformed numbers yield `Ok(false)`. Ban-classified provider errors
    /// are returned immediately; other provider errors are retried internally
    /// before being returned.
    async fn check(&self, phone_number: &str) -> Result<bool, CourierError>;

    /// Releases any held session.
    async fn disconnect(&self) -> Result<(), CourierError>;

    /// Drops expired cached answers. Checkers without a cache keep the default.
    async fn cleanup_cache(&self) {}
}
