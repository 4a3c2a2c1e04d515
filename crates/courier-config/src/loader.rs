// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./courier.toml` > `~/.config/courier/courier.toml` > `/etc/courier/courier.toml`
//! with environment variable overrides via `COURIER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CourierConfig;

/// Config sections, in the order env keys are matched against them.
///
/// `lead_reply` contains an underscore so it must be matched by prefix, never by splitting.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "checker",
    "delays",
    "distribution",
    "lead_reply",
    "waba",
    "notifications",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/courier/courier.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "courier.toml";

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("courier/courier.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml` (system-wide)
/// 3. `~/.config/courier/courier.toml` (user XDG config)
/// 4. `./courier.toml` (local directory)
/// 5. `COURIER_*` environment variables
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Map a prefix-stripped env key to its dotted config path.
///
/// `delays_waba_min_secs` becomes `delays.waba_min_secs` and
/// `lead_reply_rate_limit_secs` becomes `lead_reply.rate_limit_secs`.
/// Keys outside every known section are passed through unchanged so that
/// `deny_unknown_fields` reports them.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

/// Environment provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: field names contain
/// underscores (`COURIER_NOTIFICATIONS_TELEGRAM_BOT_TOKEN` must map to
/// `notifications.telegram_bot_token`).
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_underscore_after_section() {
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
        assert_eq!(map_env_key("delays_waba_min_secs"), "delays.waba_min_secs");
        assert_eq!(
            map_env_key("lead_reply_rate_limit_secs"),
            "lead_reply.rate_limit_secs"
        );
        assert_eq!(
            map_env_key("notifications_telegram_bot_token"),
            "notifications.telegram_bot_token"
        );
        assert_eq!(map_env_key("waba_access_token"), "waba.access_token");
    }

    #[test]
    fn env_keys_are_matched_case_insensitively() {
        assert_eq!(
            map_env_key("LEAD_REPLY_RATE_LIMIT_SECS"),
            "lead_reply.rate_limit_secs"
        );
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("something_else"), "something_else");
        assert_eq!(map_env_key("storage"), "storage");
    }
}
