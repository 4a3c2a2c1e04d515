// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Everything Courier consumes from the outside world (messenger sessions,
//! persistence, operator notifications) sits behind one of these traits and
//! uses `#[async_trait]` for dynamic dispatch compatibility.

pub mod checker;
pub mod notify;
pub mod repository;
pub mod session;

pub use checker::PlatformChecker;
pub use notify::NotificationSink;
pub use repository::{CampaignRepository, DialogService, LeadService, PhoneNumberRepository};
pub use session::{MessengerSession, SessionProvider};
