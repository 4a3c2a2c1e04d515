// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier distribution platform.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::time::Duration;

use courier_core::Platform;
use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Reachability checker retry and cache settings.
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Randomized inter-send delays per platform.
    #[serde(default)]
    pub delays: DelayConfig,

    /// Distribution defaults and bulk pacing.
    #[serde(default)]
    pub distribution: DistributionConfig,

    /// Automatic replies to inbound leads.
    #[serde(default)]
    pub lead_reply: LeadReplyConfig,

    /// WhatsApp Business (Cloud API) provider settings.
    #[serde(default)]
    pub waba: WabaConfig,

    /// Operator notification delivery.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "courier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("courier.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Reachability checker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CheckerConfig {
    /// Attempts per check before giving up (checker and orchestrator level).
    #[serde(default = "default_check_attempts")]
    pub attempts: u32,

    /// Fixed backoff between attempts, in seconds.
    #[serde(default = "default_check_backoff_secs")]
    pub backoff_secs: u64,

    /// How long a reachability answer stays cached, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval of the background cache cleanup, in seconds.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl CheckerConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            attempts: default_check_attempts(),
            backoff_secs: default_check_backoff_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_check_attempts() -> u32 {
    3
}

fn default_check_backoff_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

/// Randomized pause before each send, per platform, in seconds.
///
/// Keeps outbound traffic from looking automated to the messenger provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DelayConfig {
    #[serde(default = "default_telegram_min_secs")]
    pub telegram_min_secs: u64,
    #[serde(default = "default_telegram_max_secs")]
    pub telegram_max_secs: u64,
    #[serde(default = "default_whatsapp_min_secs")]
    pub whatsapp_min_secs: u64,
    #[serde(default = "default_whatsapp_max_secs")]
    pub whatsapp_max_secs: u64,
    #[serde(default)]
    pub waba_min_secs: u64,
    #[serde(default = "default_waba_max_secs")]
    pub waba_max_secs: u64,
}

impl DelayConfig {
    /// A configuration with no delays at all.
    pub fn zero() -> Self {
        Self {
            telegram_min_secs: 0,
            telegram_max_secs: 0,
            whatsapp_min_secs: 0,
            whatsapp_max_secs: 0,
            waba_min_secs: 0,
            waba_max_secs: 0,
        }
    }

    /// The `(min, max)` bounds for `platform`, in seconds.
    pub fn bounds(&self, platform: Platform) -> (u64, u64) {
        match platform {
            Platform::Telegram => (self.telegram_min_secs, self.telegram_max_secs),
            Platform::WhatsApp => (self.whatsapp_min_secs, self.whatsapp_max_secs),
            Platform::Waba => (self.waba_min_secs, self.waba_max_secs),
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            telegram_min_secs: default_telegram_min_secs(),
            telegram_max_secs: default_telegram_max_secs(),
            whatsapp_min_secs: default_whatsapp_min_secs(),
            whatsapp_max_secs: default_whatsapp_max_secs(),
            waba_min_secs: 0,
            waba_max_secs: default_waba_max_secs(),
        }
    }
}

fn default_telegram_min_secs() -> u64 {
    10
}

fn default_telegram_max_secs() -> u64 {
    60
}

fn default_whatsapp_min_secs() -> u64 {
    30
}

fn default_whatsapp_max_secs() -> u64 {
    300
}

fn default_waba_max_secs() -> u64 {
    5
}

/// Distribution defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionConfig {
    /// Platform token used when a caller passes none.
    #[serde(default = "default_platform")]
    pub default_platform: String,

    /// Pause between contacts in a bulk run, in milliseconds.
    #[serde(default = "default_bulk_pause_ms")]
    pub bulk_pause_ms: u64,
}

impl DistributionConfig {
    pub fn bulk_pause(&self) -> Duration {
        Duration::from_millis(self.bulk_pause_ms)
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            default_platform: default_platform(),
            bulk_pause_ms: default_bulk_pause_ms(),
        }
    }
}

fn default_platform() -> String {
    "telegram".to_string()
}

fn default_bulk_pause_ms() -> u64 {
    1000
}

/// Inbound lead auto-reply configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadReplyConfig {
    /// Minimum seconds between two replies to the same (lead, operator) pair.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,
}

impl LeadReplyConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }
}

impl Default for LeadReplyConfig {
    fn default() -> Self {
        Self {
            rate_limit_secs: default_rate_limit_secs(),
        }
    }
}

fn default_rate_limit_secs() -> u64 {
    60
}

/// WhatsApp Business Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WabaConfig {
    /// Graph API base URL.
    #[serde(default = "default_waba_api_base")]
    pub api_base: String,

    /// Graph API version segment.
    #[serde(default = "default_waba_api_version")]
    pub api_version: String,

    /// System user access token. `None` disables the WABA provider.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Sender phone number (`+digits`) to Cloud API phone number id.
    #[serde(default)]
    pub phone_number_ids: BTreeMap<String, String>,
}

impl Default for WabaConfig {
    fn default() -> Self {
        Self {
            api_base: default_waba_api_base(),
            api_version: default_waba_api_version(),
            access_token: None,
            phone_number_ids: BTreeMap::new(),
        }
    }
}

fn default_waba_api_base() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_waba_api_version() -> String {
    "v21.0".to_string()
}

/// Operator notification configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Telegram Bot API token used to notify operators. `None` means
    /// notifications are only logged.
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
}
