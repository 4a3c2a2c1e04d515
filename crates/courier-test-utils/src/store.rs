// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of every repository trait.
//!
//! Mirrors the SQLite semantics closely enough for unit tests, and records
//! ban write-backs and lead updates for assertions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{
    BanUpdate, Campaign, CampaignPhoneNumber, CampaignRepository, CourierError, DialogService,
    LeadService, PhoneNumberRepository, Platform, SenderPhoneNumber,
};

/// A dialog row as saved by a sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDialog {
    pub user_id: String,
    pub contact_id: String,
    pub platform: Platform,
    pub request: String,
    pub response: String,
    pub recipient_phone: String,
}

#[derive(Default)]
struct State {
    campaigns: HashMap<String, Campaign>,
    attached: HashMap<String, Vec<CampaignPhoneNumber>>,
    numbers: HashMap<String, SenderPhoneNumber>,
    unavailable_leads: Vec<String>,
    bans: Vec<(String, BanUpdate)>,
    dialogs: Vec<SavedDialog>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_campaign(&self, campaign: Campaign) {
        let mut state = self.state.lock().await;
        state.campaigns.insert(campaign.id.clone(), campaign);
    }

    pub async fn add_phone_number(&self, number: SenderPhoneNumber) {
        let mut state = self.state.lock().await;
        state.numbers.insert(number.phone_number.clone(), number);
    }

    /// Attach a number at the end of the campaign's order. Duplicates are ignored.
    pub async fn attach(&self, campaign_id: &str, number: CampaignPhoneNumber) {
        let mut state = self.state.lock().await;
        let attached = state.attached.entry(campaign_id.to_string()).or_default();
        if !attached.contains(&number) {
            attached.push(number);
        }
    }

    pub async fn phone_number(&self, phone_number: &str) -> Option<SenderPhoneNumber> {
        self.state.lock().await.numbers.get(phone_number).cloned()
    }

    /// Leads marked unavailable, in call order.
    pub async fn unavailable_leads(&self) -> Vec<String> {
        self.state.lock().await.unavailable_leads.clone()
    }

    /// Ban write-backs, in call order, including those for unknown numbers.
    pub async fn ban_updates(&self) -> Vec<(String, BanUpdate)> {
        self.state.lock().await.bans.clone()
    }

    pub async fn dialogs(&self) -> Vec<SavedDialog> {
        self.state.lock().await.dialogs.clone()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryStore {
    async fn get_campaign_phone_numbers(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<CampaignPhoneNumber>, CourierError> {
        Ok(self
            .state
            .lock()
            .await
            .attached
            .get(campaign_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_platform_priority(&self, campaign_id: &str) -> Result<Option<String>, CourierError> {
        Ok(self
            .state
            .lock()
            .await
            .campaigns
            .get(campaign_id)
            .map(|c| c.platform_priority.clone()))
    }

    async fn get_campaign_by_id(&self, campaign_id: &str) -> Result<Option<Campaign>, CourierError> {
        Ok(self.state.lock().await.campaigns.get(campaign_id).cloned())
    }

    async fn get_active_campaign(&self, user_id: &str) -> Result<Option<Campaign>, CourierError> {
        let state = self.state.lock().await;
        let mut active: Vec<&Campaign> = state
            .campaigns
            .values()
            .filter(|c| c.user_id == user_id && c.is_active)
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active.first().map(|c| (*c).clone()))
    }
}

#[async_trait]
impl PhoneNumberRepository for InMemoryStore {
    async fn get_phone_number_info(
        &self,
        phone_number: &str,
    ) -> Result<Option<SenderPhoneNumber>, CourierError> {
        Ok(self.phone_number(phone_number).await)
    }

    async fn reserve_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<bool, CourierError> {
        let mut state = self.state.lock().await;
        let Some(account) = state
            .numbers
            .get_mut(phone_number)
            .and_then(|n| n.account_mut(platform))
        else {
            return Ok(false);
        };
        if !account.has_quota() {
            return Ok(false);
        }
        let delta = u32::from(is_new_contact);
        account.messages_sent_today += 1;
        account.messages_sent_total += 1;
        account.contacts_reached_today += delta;
        account.contacts_reached_total += delta;
        Ok(true)
    }

    async fn release_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        if let Some(account) = state
            .numbers
            .get_mut(phone_number)
            .and_then(|n| n.account_mut(platform))
        {
            let delta = u32::from(is_new_contact);
            account.messages_sent_today = account.messages_sent_today.saturating_sub(1);
            account.messages_sent_total = account.messages_sent_total.saturating_sub(1);
            account.contacts_reached_today = account.contacts_reached_today.saturating_sub(delta);
            account.contacts_reached_total = account.contacts_reached_total.saturating_sub(delta);
        }
        Ok(())
    }

    async fn update_phone_number_ban_status(
        &self,
        phone_number: &str,
        ban: &BanUpdate,
    ) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        if let Some(number) = state.numbers.get_mut(phone_number) {
            number.is_banned = true;
            number.ban_status = Some(ban.status);
            number.ban_expires_at = ban.expires_at;
        }
        state.bans.push((phone_number.to_string(), ban.clone()));
        Ok(())
    }
}

#[async_trait]
impl LeadService for InMemoryStore {
    async fn set_lead_unavailable(&self, phone_number: &str) -> Result<(), CourierError> {
        self.state
            .lock()
            .await
            .unavailable_leads
            .push(phone_number.to_string());
        Ok(())
    }
}

#[async_trait]
impl DialogService for InMemoryStore {
    async fn save_dialog(
        &self,
        user_id: &str,
        contact_id: &str,
        platform: Platform,
        request: &str,
        response: &str,
        recipient_phone: &str,
    ) -> Result<(), CourierError> {
        self.state.lock().await.dialogs.push(SavedDialog {
            user_id: user_id.to_string(),
            contact_id: contact_id.to_string(),
            platform,
            request: request.to_string(),
            response: response.to_string(),
            recipient_phone: recipient_phone.to_string(),
        });
        Ok(())
    }

    async fn is_new_contact(
        &self,
        user_id: &str,
        recipient_phone: &str,
        platform: Platform,
    ) -> Result<bool, CourierError> {
        let state = self.state.lock().await;
        Ok(!state.dialogs.iter().any(|d| {
            d.user_id == user_id && d.recipient_phone == recipient_phone && d.platform == platform
        }))
    }
}
