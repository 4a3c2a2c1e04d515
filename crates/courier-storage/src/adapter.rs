// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use courier_config::model::StorageConfig;
use courier_core::{
    BanUpdate, Campaign, CampaignPhoneNumber, CampaignRepository, CourierError, DialogService,
    Lead, LeadService, LeadStatus, PhoneNumberRepository, Platform, SenderPhoneNumber,
};

use crate::database::Database;
use crate::queries;
use crate::queries::dialogs::DialogRecord;

/// SQLite-backed storage for campaigns, sender numbers, leads and dialogs.
///
/// The database is opened lazily by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, CourierError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    pub async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    // --- Campaign administration ---

    pub async fn upsert_campaign(&self, campaign: &Campaign) -> Result<(), CourierError> {
        queries::campaigns::upsert_campaign(self.db()?, campaign).await
    }

    pub async fn attach_phone_number(
        &self,
        campaign_id: &str,
        phone_number: &str,
        platform: Platform,
    ) -> Result<(), CourierError> {
        queries::campaigns::attach_phone_number(self.db()?, campaign_id, phone_number, platform)
            .await
    }

    pub async fn detach_phone_number(
        &self,
        campaign_id: &str,
        phone_number: &str,
        platform: Platform,
    ) -> Result<bool, CourierError> {
        queries::campaigns::detach_phone_number(self.db()?, campaign_id, phone_number, platform)
            .await
    }

    pub async fn activate_campaign(&self, campaign_id: &str) -> Result<(), CourierError> {
        queries::campaigns::activate_campaign(self.db()?, campaign_id).await
    }

    pub async fn deactivate_campaign(&self, campaign_id: &str) -> Result<(), CourierError> {
        queries::campaigns::deactivate_campaign(self.db()?, campaign_id).await
    }

    // --- Sender number administration ---

    pub async fn upsert_phone_number(&self, number: &SenderPhoneNumber) -> Result<(), CourierError> {
        queries::phone_numbers::upsert_phone_number(self.db()?, number).await
    }

    pub async fn list_phone_numbers(&self) -> Result<Vec<SenderPhoneNumber>, CourierError> {
        queries::phone_numbers::list_phone_numbers(self.db()?).await
    }

    /// Daily reset job: zero today's counters and lift expired bans.
    pub async fn reset_daily_counters(&self, now: DateTime<Utc>) -> Result<usize, CourierError> {
        let reset = queries::phone_numbers::reset_daily_counters(self.db()?, now).await?;
        debug!(accounts = reset, "daily counters reset");
        Ok(reset)
    }

    // --- Leads and dialogs ---

    pub async fn upsert_lead(&self, lead: &Lead) -> Result<(), CourierError> {
        queries::leads::upsert_lead(self.db()?, lead).await
    }

    pub async fn get_lead_status(&self, phone_number: &str) -> Result<Option<LeadStatus>, CourierError> {
        queries::leads::get_lead_status(self.db()?, phone_number).await
    }

    pub async fn list_dialogs(&self, user_id: &str) -> Result<Vec<DialogRecord>, CourierError> {
        queries::dialogs::list_dialogs(self.db()?, user_id).await
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(self) -> Result<(), CourierError> {
        match self.db.into_inner() {
            Some(db) => db.close().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampaignRepository for SqliteStorage {
    async fn get_campaign_phone_numbers(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<CampaignPhoneNumber>, CourierError> {
        queries::campaigns::get_campaign_phone_numbers(self.db()?, campaign_id).await
    }

    async fn get_platform_priority(&self, campaign_id: &str) -> Result<Option<String>, CourierError> {
        queries::campaigns::get_platform_priority(self.db()?, campaign_id).await
    }

    async fn get_campaign_by_id(&self, campaign_id: &str) -> Result<Option<Campaign>, CourierError> {
        queries::campaigns::get_campaign(self.db()?, campaign_id).await
    }

    async fn get_active_campaign(&self, user_id: &str) -> Result<Option<Campaign>, CourierError> {
        queries::campaigns::get_active_campaign(self.db()?, user_id).await
    }
}

#[async_trait]
impl PhoneNumberRepository for SqliteStorage {
    async fn get_phone_number_info(
        &self,
        phone_number: &str,
    ) -> Result<Option<SenderPhoneNumber>, CourierError> {
        queries::phone_numbers::get_phone_number(self.db()?, phone_number).await
    }

    async fn reserve_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<bool, CourierError> {
        queries::phone_numbers::reserve_send(self.db()?, phone_number, platform, is_new_contact)
            .await
    }

    async fn release_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<(), CourierError> {
        queries::phone_numbers::release_send(self.db()?, phone_number, platform, is_new_contact)
            .await
    }

    async fn update_phone_number_ban_status(
        &self,
        phone_number: &str,
        ban: &BanUpdate,
    ) -> Result<(), CourierError> {
        let known = queries::phone_numbers::update_ban_status(self.db()?, phone_number, ban).await?;
        if !known {
            warn!(phone_number, status = %ban.status, "ban reported for unknown sender number");
        }
        Ok(())
    }
}

#[async_trait]
impl LeadService for SqliteStorage {
    async fn set_lead_unavailable(&self, phone_number: &str) -> Result<(), CourierError> {
        queries::leads::set_lead_status(self.db()?, phone_number, LeadStatus::Unavailable).await
    }
}

#[async_trait]
impl DialogService for SqliteStorage {
    async fn save_dialog(
        &self,
        user_id: &str,
        contact_id: &str,
        platform: Platform,
        request: &str,
        response: &str,
        recipient_phone: &str,
    ) -> Result<(), CourierError> {
        let record = DialogRecord {
            user_id: user_id.to_string(),
            contact_id: contact_id.to_string(),
            recipient_phone: recipient_phone.to_string(),
            platform: platform.to_string(),
            request: request.to_string(),
            response: response.to_string(),
        };
        queries::dialogs::insert_dialog(self.db()?, record).await
    }

    async fn is_new_contact(
        &self,
        user_id: &str,
        recipient_phone: &str,
        platform: Platform,
    ) -> Result<bool, CourierError> {
        let seen =
            queries::dialogs::has_dialog(self.db()?, user_id, recipient_phone, platform).await?;
        Ok(!seen)
    }
}
