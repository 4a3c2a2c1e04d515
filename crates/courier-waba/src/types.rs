// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API request and response bodies.

use serde::{Deserialize, Serialize};

/// `GET /{version}/{phone_number_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneNumberInfo {
    pub id: String,
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub verified_name: Option<String>,
    #[serde(default)]
    pub quality_rating: Option<String>,
}

/// `POST /{version}/{phone_number_id}/contacts`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactsRequest {
    pub blocking: &'static str,
    pub contacts: Vec<String>,
    pub force_check: bool,
}

impl ContactsRequest {
    pub fn single(recipient: &str) -> Self {
        Self {
            blocking: "wait",
            contacts: vec![format!("+{}", recipient.trim_start_matches('+'))],
            force_check: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Vec<ContactEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactEntry {
    pub input: String,
    pub status: String,
    #[serde(default)]
    pub wa_id: Option<String>,
}

impl ContactEntry {
    pub fn is_valid(&self) -> bool {
        self.status == "valid"
    }
}

/// `POST /{version}/{phone_number_id}/messages` with a text body.
#[derive(Debug, Clone, Serialize)]
pub struct TextMessageRequest {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub text: TextBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBody {
    pub preview_url: bool,
    pub body: String,
}

impl TextMessageRequest {
    pub fn new(to: &str, body: &str) -> Self {
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: to.to_string(),
            message_type: "text",
            text: TextBody {
                preview_url: false,
                body: body.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// Graph API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: i64,
}
