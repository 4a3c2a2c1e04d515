// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Business Cloud API.
//!
//! Provides [`WabaClient`] which handles authentication, request
//! construction, and mapping of Graph API errors onto provider errors.
//! Rate limiting is reported as `FLOOD_WAIT` so ban classification treats
//! it like a messenger flood wait.

use std::time::Duration;

use courier_config::model::WabaConfig;
use courier_core::{CourierError, ban};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, ContactsRequest, ContactsResponse, PhoneNumberInfo, SendMessageResponse,
    TextMessageRequest,
};

/// Graph API error codes meaning "slow down".
const RATE_LIMIT_CODES: &[i64] = &[4, 80007, 130429, 131056];

/// HTTP client for Cloud API communication.
#[derive(Debug, Clone)]
pub struct WabaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WabaClient {
    /// Creates a client from the `[waba]` configuration section.
    ///
    /// Fails when no access token is configured.
    pub fn new(config: &WabaConfig) -> Result<Self, CourierError> {
        let token = config
            .access_token
            .as_deref()
            .ok_or_else(|| CourierError::Config("waba.access_token is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                CourierError::Config(format!("invalid WABA access token header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CourierError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
        })
    }

    fn url(&self, phone_number_id: &str, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => format!("{}/{phone_number_id}/{suffix}", self.base_url),
            None => format!("{}/{phone_number_id}", self.base_url),
        }
    }

    /// Fetches the phone number record. `Ok(None)` when the token is not
    /// allowed to use this number.
    pub async fn phone_number(
        &self,
        phone_number_id: &str,
    ) -> Result<Option<PhoneNumberInfo>, CourierError> {
        let response = self
            .client
            .get(self.url(phone_number_id, None))
            .send()
            .await
            .map_err(request_failed)?;
        let status = response.status();
        debug!(status = %status, "phone number info received");
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    /// Resolves a recipient to its WhatsApp id, or `None` if it has no account.
    pub async fn check_contact(
        &self,
        phone_number_id: &str,
        recipient: &str,
    ) -> Result<Option<String>, CourierError> {
        let response = self
            .client
            .post(self.url(phone_number_id, Some("contacts")))
            .json(&ContactsRequest::single(recipient))
            .send()
            .await
            .map_err(request_failed)?;
        let body: ContactsResponse = read_json(response).await?;
        Ok(body
            .contacts
            .into_iter()
            .find(|c| c.is_valid())
            .and_then(|c| c.wa_id))
    }

    /// Sends a text message and returns the provider message id.
    pub async fn send_text(
        &self,
        phone_number_id: &str,
        to: &str,
        text: &str,
    ) -> Result<String, CourierError> {
        let response = self
            .client
            .post(self.url(phone_number_id, Some("messages")))
            .json(&TextMessageRequest::new(to, text))
            .send()
            .await
            .map_err(request_failed)?;
        let body: SendMessageResponse = read_json(response).await?;
        body.messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| CourierError::provider("WABA send response carried no message id"))
    }
}

fn request_failed(e: reqwest::Error) -> CourierError {
    CourierError::Provider {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CourierError> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.min(ban::MAX_FLOOD_WAIT_SECS));
    let body = response.text().await.map_err(|e| CourierError::Provider {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;

    if !status.is_success() {
        return Err(api_error(status, retry_after, &body));
    }
    serde_json::from_str(&body).map_err(|e| CourierError::Provider {
        message: format!("failed to parse WABA response: {e}"),
        source: Some(Box::new(e)),
    })
}

fn api_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> CourierError {
    let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || parsed
            .as_ref()
            .is_some_and(|e| RATE_LIMIT_CODES.contains(&e.error.code));

    if rate_limited {
        return match retry_after {
            Some(secs) => CourierError::provider(format!("FLOOD_WAIT: {secs} (WABA rate limit)")),
            None => CourierError::provider("FLOOD_WAIT (WABA rate limit)"),
        };
    }
    match parsed {
        Some(e) => CourierError::provider(format!(
            "WABA API error {} ({}): {}",
            e.error.code,
            e.error.type_.as_deref().unwrap_or("unknown"),
            e.error.message
        )),
        None => CourierError::provider(format!("WABA API returned {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::BanStatus;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WabaClient {
        WabaClient::new(&WabaConfig {
            api_base: server.uri(),
            api_version: "v21.0".into(),
            access_token: Some("test-token".into()),
            ..WabaConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = WabaClient::new(&WabaConfig::default()).unwrap_err();
        assert!(matches!(err, CourierError::Config(_)));
    }

    #[tokio::test]
    async fn phone_number_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v21.0/pn-1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pn-1",
                "display_phone_number": "+1 555-000-0001",
                "quality_rating": "GREEN"
            })))
            .mount(&server)
            .await;

        let info = client(&server).phone_number("pn-1").await.unwrap().unwrap();
        assert_eq!(info.id, "pn-1");
        assert_eq!(info.quality_rating.as_deref(), Some("GREEN"));
    }

    #[tokio::test]
    async fn unauthorized_phone_number_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v21.0/pn-1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid OAuth access token", "type": "OAuthException", "code": 190}
            })))
            .mount(&server)
            .await;

        assert!(client(&server).phone_number("pn-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn check_contact_returns_wa_id_for_valid_contacts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/contacts"))
            .and(body_partial_json(serde_json::json!({"contacts": ["+15551234567"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contacts": [{"input": "+15551234567", "status": "valid", "wa_id": "15551234567"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/contacts"))
            .and(body_partial_json(serde_json::json!({"contacts": ["+15559999999"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contacts": [{"input": "+15559999999", "status": "invalid"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(
            client.check_contact("pn-1", "15551234567").await.unwrap().as_deref(),
            Some("15551234567")
        );
        assert_eq!(client.check_contact("pn-1", "15559999999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn send_text_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/messages"))
            .and(body_partial_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "15551234567",
                "type": "text",
                "text": {"body": "hello"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{"id": "wamid.abc"}]
            })))
            .mount(&server)
            .await;

        let id = client(&server)
            .send_text("pn-1", "15551234567", "hello")
            .await
            .unwrap();
        assert_eq!(id, "wamid.abc");
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_flood_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/messages"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_text("pn-1", "15551234567", "hello")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert_eq!(ban::classify(&message), Some(BanStatus::FloodWait));
        assert_eq!(ban::flood_wait_seconds(&message), Some(30));
    }

    #[tokio::test]
    async fn huge_retry_after_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/messages"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .send_text("pn-1", "15551234567", "hello")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert_eq!(
            ban::flood_wait_seconds(&message),
            Some(ban::MAX_FLOOD_WAIT_SECS)
        );
    }

    #[tokio::test]
    async fn throughput_error_code_maps_to_flood_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit hit", "type": "OAuthException", "code": 130429}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_text("pn-1", "15551234567", "hello")
            .await
            .unwrap_err();
        assert_eq!(ban::classify(&err.to_string()), Some(BanStatus::FloodWait));
    }

    #[tokio::test]
    async fn other_api_errors_keep_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/pn-1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid parameter", "type": "OAuthException", "code": 100}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_text("pn-1", "15551234567", "hello")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("WABA API error 100"), "{message}");
        assert!(message.contains("Invalid parameter"));
        assert_eq!(ban::classify(&message), None);
    }
}
