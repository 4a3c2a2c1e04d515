// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator traits.
//!
//! Courier never holds authoritative state; campaigns, sender numbers, leads
//! and dialogs are read and mutated exclusively through these traits.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{BanUpdate, Campaign, CampaignPhoneNumber, Platform, SenderPhoneNumber};

/// Read access to campaigns.
#[async_trait]
pub trait CampaignRepository: Send + Sync + 'static {
    /// Sender numbers attached to the campaign, in attach order.
    async fn get_campaign_phone_numbers(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<CampaignPhoneNumber>, CourierError>;

    /// The campaign's stored platform token.
    async fn get_platform_priority(&self, campaign_id: &str) -> Result<Option<String>, CourierError>;

    async fn get_campaign_by_id(&self, campaign_id: &str) -> Result<Option<Campaign>, CourierError>;

    /// The operator's currently active campaign, if any.
    async fn get_active_campaign(&self, user_id: &str) -> Result<Option<Campaign>, CourierError>;
}

/// Sender number records and their counters.
#[async_trait]
pub trait PhoneNumberRepository: Send + Sync + 'static {
    async fn get_phone_number_info(
        &self,
        phone_number: &str,
    ) -> Result<Option<SenderPhoneNumber>, CourierError>;

    /// Atomically reserves quota for one send.
    ///
    /// Succeeds only while `contacts_reached_today < daily_limit` (and under the
    /// lifetime cap). On success the message counters are incremented, and the
    /// contact counters too when `is_new_contact`. Returns `false` when the
    /// number, account, or quota is missing.
    async fn reserve_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<bool, CourierError>;

    /// Undoes a successful [`reserve_send`](Self::reserve_send) whose send failed.
    async fn release_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<(), CourierError>;

    /// Records a classified ban on the number.
    async fn update_phone_number_ban_status(
        &self,
        phone_number: &str,
        ban: &BanUpdate,
    ) -> Result<(), CourierError>;
}

/// Lead status updates.
#[async_trait]
pub trait LeadService: Send + Sync + 'static {
    /// Marks the lead `UNAVAILABLE`: it cannot be reached on any platform.
    async fn set_lead_unavailable(&self, phone_number: &str) -> Result<(), CourierError>;
}

/// Dialog history.
#[async_trait]
pub trait DialogService: Send + Sync + 'static {
    async fn save_dialog(
        &self,
        user_id: &str,
        contact_id: &str,
        platform: Platform,
        request: &str,
        response: &str,
        recipient_phone: &str,
    ) -> Result<(), CourierError>;

    /// Whether the operator has never messaged this recipient on `platform`.
    async fn is_new_contact(
        &self,
        user_id: &str,
        recipient_phone: &str,
        platform: Platform,
    ) -> Result<bool, CourierError>;
}
