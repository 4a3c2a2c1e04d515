// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message distribution for the Courier platform.
//!
//! Picks a reachable platform for each recipient, a sender number with quota
//! left on that platform, and rotates to the next number when one runs out.

pub mod metrics;
pub mod rate_limit;
pub mod rotation;
pub mod service;

pub use rate_limit::RateLimiter;
pub use rotation::PhoneNumberManager;
pub use service::{LeadReplyOutcome, MessageDistributionService};
