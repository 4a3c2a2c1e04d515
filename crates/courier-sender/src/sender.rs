// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One send from one sender number to one recipient.
//!
//! A send runs these steps in order, stopping at the first failure:
//!
//! 1. resolve the campaign to its owning operator
//! 2. decide whether the recipient is a new contact for the operator
//! 3. reserve quota on the sender number (`DAILY_LIMIT_REACHED` when none is left)
//! 4. confirm the sender session is authorized
//! 5. pace the send with the delay strategy
//! 6. resolve the recipient to a platform contact
//! 7. deliver through the session
//! 8. persist the dialog record
//!
//! Any failure after step 3 releases the reservation. Every failure is returned
//! as a [`SendError`]; nothing escapes as an infrastructure error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use courier_core::{
    BanStatus, CampaignRepository, Clock, CourierError, DialogService, LeadService, MessageId,
    MessengerSession, PhoneNumberRepository, Platform, SendError, SendReceipt, SessionProvider,
    ban, phone,
};

use crate::delay::DelayStrategy;

pub struct MessageSender {
    campaigns: Arc<dyn CampaignRepository>,
    phones: Arc<dyn PhoneNumberRepository>,
    dialogs: Arc<dyn DialogService>,
    leads: Arc<dyn LeadService>,
    sessions: HashMap<Platform, Arc<dyn SessionProvider>>,
    delay: Arc<dyn DelayStrategy>,
    clock: Arc<dyn Clock>,
}

/// A reservation that must be released if the send does not go through.
struct Reservation<'a> {
    phones: &'a dyn PhoneNumberRepository,
    sender: &'a str,
    platform: Platform,
    is_new_contact: bool,
}

impl Reservation<'_> {
    async fn release(self) {
        if let Err(e) = self
            .phones
            .release_send(self.sender, self.platform, self.is_new_contact)
            .await
        {
            warn!(sender = self.sender, platform = %self.platform, error = %e, "failed to release quota");
        }
    }
}

fn provider_error(e: CourierError) -> SendError {
    SendError::Provider(e.to_string())
}

impl MessageSender {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        phones: Arc<dyn PhoneNumberRepository>,
        dialogs: Arc<dyn DialogService>,
        leads: Arc<dyn LeadService>,
        delay: Arc<dyn DelayStrategy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            campaigns,
            phones,
            dialogs,
            leads,
            sessions: HashMap::new(),
            delay,
            clock,
        }
    }

    /// Register the session provider for its platform.
    pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.sessions.insert(provider.platform(), provider);
        self
    }

    /// Whether a session provider is registered for `platform`.
    pub fn supports(&self, platform: Platform) -> bool {
        self.sessions.contains_key(&platform)
    }

    pub async fn send_telegram_message(
        &self,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        self.send(Platform::Telegram, campaign_id, sender, recipient, message)
            .await
    }

    pub async fn send_whatsapp_message(
        &self,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        self.send(Platform::WhatsApp, campaign_id, sender, recipient, message)
            .await
    }

    pub async fn send_waba_message(
        &self,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        self.send(Platform::Waba, campaign_id, sender, recipient, message)
            .await
    }

    /// Send on Telegram and WhatsApp from the same number.
    ///
    /// Succeeds if either send succeeds, reporting the first success;
    /// otherwise reports the first error.
    pub async fn send_tg_and_wa(
        &self,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        self.send_pair(
            (Platform::Telegram, Platform::WhatsApp),
            campaign_id,
            sender,
            recipient,
            message,
        )
        .await
    }

    /// Send on Telegram and WhatsApp Business from the same number.
    pub async fn send_tg_and_waba(
        &self,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        self.send_pair(
            (Platform::Telegram, Platform::Waba),
            campaign_id,
            sender,
            recipient,
            message,
        )
        .await
    }

    async fn send_pair(
        &self,
        (first, second): (Platform, Platform),
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        let a = self.send(first, campaign_id, sender, recipient, message).await;
        let b = self.send(second, campaign_id, sender, recipient, message).await;
        match (a, b) {
            (Ok(receipt), _) | (Err(_), Ok(receipt)) => Ok(receipt),
            (Err(e), Err(_)) => Err(e),
        }
    }

    /// Send `message` from `sender` to `recipient` on `platform`.
    pub async fn send(
        &self,
        platform: Platform,
        campaign_id: &str,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<SendReceipt, SendError> {
        if campaign_id.trim().is_empty() {
            return Err(SendError::CampaignIdUndefined);
        }
        let campaign = self
            .campaigns
            .get_campaign_by_id(campaign_id)
            .await
            .map_err(provider_error)?
            .ok_or(SendError::CampaignNotFound)?;
        let user_id = campaign.user_id;
        let recipient = phone::normalize(recipient).map_err(provider_error)?;

        let is_new_contact = self
            .dialogs
            .is_new_contact(&user_id, &recipient, platform)
            .await
            .map_err(provider_error)?;

        let reserved = self
            .phones
            .reserve_send(sender, platform, is_new_contact)
            .await
            .map_err(provider_error)?;
        if !reserved {
            debug!(campaign_id, sender, %platform, "sender has no quota left");
            return Err(SendError::DailyLimitReached);
        }
        let reservation = Reservation {
            phones: self.phones.as_ref(),
            sender,
            platform,
            is_new_contact,
        };

        match self
            .deliver(platform, sender, &recipient, message)
            .await
        {
            Ok((contact_id, message_id)) => {
                if let Err(e) = self
                    .dialogs
                    .save_dialog(&user_id, &contact_id, platform, "", message, &recipient)
                    .await
                {
                    warn!(campaign_id, %recipient, error = %e, "failed to save dialog");
                }
                info!(campaign_id, sender, %recipient, %platform, new_contact = is_new_contact, "message sent");
                Ok(SendReceipt {
                    message_id,
                    sender: sender.to_string(),
                    platform,
                })
            }
            Err(e) => {
                reservation.release().await;
                warn!(campaign_id, sender, %recipient, %platform, error = %e, "send failed");
                Err(e)
            }
        }
    }

    /// Steps 4 to 7. Returns the contact id and provider message id.
    async fn deliver(
        &self,
        platform: Platform,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> Result<(String, MessageId), SendError> {
        let session = self.session(platform, sender).await?;
        match session.is_authorized().await {
            Ok(true) => {}
            Ok(false) => return Err(SendError::ClientNotAuthorized),
            Err(e) => return Err(self.classify_failure(sender, None, e).await),
        }

        self.delay.pause(platform).await;

        let formatted = phone::format_for(platform, recipient).map_err(provider_error)?;
        let contact_id = match session.lookup(&formatted).await {
            Ok(Some(contact_id)) => contact_id,
            Ok(None) => {
                info!(%recipient, %platform, "recipient not found, marking lead unavailable");
                if let Err(e) = self.leads.set_lead_unavailable(recipient).await {
                    warn!(%recipient, error = %e, "failed to mark lead unavailable");
                }
                return Err(SendError::RecipientNotFound);
            }
            Err(e) => return Err(self.classify_failure(sender, Some(recipient), e).await),
        };

        match session.send_message(&contact_id, message).await {
            Ok(message_id) => Ok((contact_id, message_id)),
            Err(e) => Err(self.classify_failure(sender, Some(recipient), e).await),
        }
    }

    async fn session(
        &self,
        platform: Platform,
        sender: &str,
    ) -> Result<Arc<dyn MessengerSession>, SendError> {
        let provider = self
            .sessions
            .get(&platform)
            .ok_or_else(|| provider_error(CourierError::UnsupportedPlatform(platform.to_string())))?;
        provider.session(sender).await.map_err(provider_error)
    }

    /// Turn a provider failure into a [`SendError`], recording bans on the way.
    ///
    /// `peer` is the recipient when the failure came from a lookup or send.
    /// Peer-scoped statuses are written to the number the message names, else
    /// to the recipient, whose lead is marked unavailable. Everything else
    /// lands on the sender; a flood wait bans it until the wait is over, so
    /// rotation skips it.
    async fn classify_failure(
        &self,
        sender: &str,
        peer: Option<&str>,
        error: CourierError,
    ) -> SendError {
        let message = error.to_string();
        let Some(update) = ban::ban_update(&message, self.clock.now()) else {
            return SendError::Provider(message);
        };

        let named = ban::extract_phone_number(&message).and_then(|raw| phone::normalize(&raw).ok());
        let peer = peer.filter(|_| update.status.concerns_peer());
        let banned = match (named, peer) {
            (Some(named), _) => named,
            (None, Some(recipient)) => recipient.to_string(),
            (None, None) => sender.to_string(),
        };
        warn!(phone_number = %banned, status = %update.status, "ban detected during send");
        if let Some(recipient) = peer.filter(|recipient| *recipient == banned) {
            if let Err(e) = self.leads.set_lead_unavailable(recipient).await {
                warn!(%recipient, error = %e, "failed to mark lead unavailable");
            }
        }
        if let Err(e) = self
            .phones
            .update_phone_number_ban_status(&banned, &update)
            .await
        {
            warn!(phone_number = %banned, error = %e, "failed to record ban");
        }

        match ban::flood_wait_seconds(&message) {
            Some(seconds) => SendError::FloodWait { seconds },
            None if update.status == BanStatus::FloodWait => {
                SendError::FloodWait { seconds: 0 }
            }
            None => SendError::Provider(message),
        }
    }
}
