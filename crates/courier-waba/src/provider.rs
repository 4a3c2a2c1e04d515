// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SessionProvider`] over the Cloud API.
//!
//! A WABA "session" is stateless: it pairs the shared HTTP client with the
//! Cloud API phone number id configured for a sender number.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use courier_config::model::WabaConfig;
use courier_core::{
    CourierError, MessageId, MessengerSession, Platform, SessionProvider, phone,
};

use crate::client::WabaClient;

pub struct WabaSessionProvider {
    client: Arc<WabaClient>,
    phone_number_ids: BTreeMap<String, String>,
}

impl WabaSessionProvider {
    /// Sender keys are normalized; keys that are not phone numbers are dropped.
    pub fn new(client: WabaClient, phone_number_ids: BTreeMap<String, String>) -> Self {
        let phone_number_ids = phone_number_ids
            .into_iter()
            .filter_map(|(sender, id)| match phone::normalize(&sender) {
                Ok(sender) => Some((sender, id)),
                Err(_) => {
                    warn!(sender = %sender, "ignoring WABA phone number id for invalid sender");
                    None
                }
            })
            .collect();
        Self {
            client: Arc::new(client),
            phone_number_ids,
        }
    }

    /// Builds the provider from `[waba]`. Fails when no access token is set.
    pub fn from_config(config: &WabaConfig) -> Result<Self, CourierError> {
        Ok(Self::new(
            WabaClient::new(config)?,
            config.phone_number_ids.clone(),
        ))
    }

    /// Sender numbers with a configured phone number id.
    pub fn senders(&self) -> impl Iterator<Item = &str> {
        self.phone_number_ids.keys().map(String::as_str)
    }
}

#[async_trait]
impl SessionProvider for WabaSessionProvider {
    fn platform(&self) -> Platform {
        Platform::Waba
    }

    async fn session(&self, sender: &str) -> Result<Arc<dyn MessengerSession>, CourierError> {
        let sender = phone::normalize(sender)?;
        let phone_number_id = self.phone_number_ids.get(&sender).ok_or_else(|| {
            CourierError::provider(format!("no WABA phone number id configured for {sender}"))
        })?;
        Ok(Arc::new(WabaSession {
            client: self.client.clone(),
            phone_number_id: phone_number_id.clone(),
        }))
    }
}

struct WabaSession {
    client: Arc<WabaClient>,
    phone_number_id: String,
}

#[async_trait]
impl MessengerSession for WabaSession {
    async fn is_authorized(&self) -> Result<bool, CourierError> {
        match self.client.phone_number(&self.phone_number_id).await? {
            Some(info) => {
                debug!(
                    phone_number_id = %info.id,
                    quality = info.quality_rating.as_deref().unwrap_or("unknown"),
                    "WABA number authorized"
                );
                Ok(true)
            }
            None => {
                warn!(phone_number_id = %self.phone_number_id, "WABA access token rejected for number");
                Ok(false)
            }
        }
    }

    async fn lookup(&self, recipient: &str) -> Result<Option<String>, CourierError> {
        self.client
            .check_contact(&self.phone_number_id, recipient)
            .await
    }

    async fn send_message(&self, contact_id: &str, text: &str) -> Result<MessageId, CourierError> {
        self.client
            .send_text(&self.phone_number_id, contact_id, text)
            .await
            .map(MessageId)
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        Ok(())
    }
}
