// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier distribution platform.
//!
//! This crate provides the domain types, error types, and collaborator trait
//! definitions shared by every other crate in the workspace: platform tokens,
//! sender numbers with their per-platform quotas, ban classification, and the
//! repository/session/notification seams.

pub mod ban;
pub mod clock;
pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::{CourierError, SendError};
pub use types::{
    BanStatus, BanUpdate, BulkDetail, BulkSummary, Campaign, CampaignPhoneNumber, CheckMode,
    ContactStatus, DeliveryOutcome, DistributionReport, Lead, LeadStatus, MessageId, Platform,
    PlatformAccount, PlatformSet, SendReceipt, SenderPhoneNumber,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    CampaignRepository, DialogService, LeadService, MessengerSession, NotificationSink,
    PhoneNumberRepository, PlatformChecker, SessionProvider,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_error_has_all_variants() {
        let _config = CourierError::Config("test".into());
        let _storage = CourierError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = CourierError::provider("test");
        let _campaign = CourierError::CampaignNotFound("c".into());
        let _message = CourierError::EmptyMessage("c".into());
        let _numbers = CourierError::NoSenderNumbers("c".into());
        let _phone = CourierError::InvalidPhoneNumber(String::new());
        let _platform = CourierError::UnsupportedPlatform("icq".into());
        let _timeout = CourierError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = CourierError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compiles only if every collaborator trait is reachable from the crate root.
        fn _assert_checker<T: PlatformChecker>() {}
        fn _assert_provider<T: SessionProvider>() {}
        fn _assert_session<T: MessengerSession>() {}
        fn _assert_campaigns<T: CampaignRepository>() {}
        fn _assert_phones<T: PhoneNumberRepository>() {}
        fn _assert_leads<T: LeadService>() {}
        fn _assert_dialogs<T: DialogService>() {}
        fn _assert_notify<T: NotificationSink>() {}
    }
}
