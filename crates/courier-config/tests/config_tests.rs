// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use std::io::Write;

use courier_config::diagnostic::ConfigError;
use courier_config::model::CourierConfig;
use courier_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// A file naming every section deserializes into the matching fields.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
name = "courier-eu"
log_level = "debug"

[storage]
database_path = "/tmp/courier-test.db"
wal_mode = false

[checker]
attempts = 5
backoff_secs = 1
cache_ttl_secs = 120
cleanup_interval_secs = 60

[delays]
telegram_min_secs = 1
telegram_max_secs = 2
whatsapp_min_secs = 3
whatsapp_max_secs = 4
waba_min_secs = 0
waba_max_secs = 0

[distribution]
default_platform = "tgwa"
bulk_pause_ms = 250

[lead_reply]
rate_limit_secs = 30

[waba]
api_base = "http://localhost:9000"
api_version = "v20.0"
access_token = "EAAB"

[waba.phone_number_ids]
"+15551234567" = "1122334455"

[notifications]
telegram_bot_token = "123:ABC"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "courier-eu");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/courier-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.checker.attempts, 5);
    assert_eq!(config.checker.cache_ttl().as_secs(), 120);
    assert_eq!(config.delays.whatsapp_max_secs, 4);
    assert_eq!(config.distribution.default_platform, "tgwa");
    assert_eq!(config.distribution.bulk_pause().as_millis(), 250);
    assert_eq!(config.lead_reply.rate_limit_secs, 30);
    assert_eq!(config.waba.api_version, "v20.0");
    assert_eq!(
        config.waba.phone_number_ids.get("+15551234567").map(String::as_str),
        Some("1122334455")
    );
    assert_eq!(
        config.notifications.telegram_bot_token.as_deref(),
        Some("123:ABC")
    );
}

/// An empty file yields the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "courier");
    assert_eq!(config.service.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.checker.attempts, 3);
    assert_eq!(config.checker.backoff_secs, 5);
    assert_eq!(config.checker.cache_ttl_secs, 3600);
    assert_eq!(config.checker.cleanup_interval_secs, 3600);
    assert_eq!(config.delays.telegram_min_secs, 10);
    assert_eq!(config.delays.telegram_max_secs, 60);
    assert_eq!(config.delays.whatsapp_min_secs, 30);
    assert_eq!(config.delays.whatsapp_max_secs, 300);
    assert_eq!(config.delays.waba_max_secs, 5);
    assert_eq!(config.distribution.default_platform, "telegram");
    assert_eq!(config.distribution.bulk_pause_ms, 1000);
    assert_eq!(config.lead_reply.rate_limit_secs, 60);
    assert_eq!(config.waba.api_base, "https://graph.facebook.com");
    assert!(config.waba.access_token.is_none());
    assert!(config.notifications.telegram_bot_token.is_none());
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[metrics]
enabled = true
"#;
    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = err.to_string();
    assert!(
        err_str.contains("unknown field") || err_str.contains("metrics"),
        "got: {err_str}"
    );
}

/// Misspelled key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn misspelled_key_suggests_correction() {
    let toml = r#"
[checker]
atempts = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, section, suggestion, valid_keys, .. } if {
            key == "atempts"
                && section == "checker"
                && suggestion.as_deref() == Some("attempts")
                && valid_keys.contains("backoff_secs")
        })
    });
    assert!(found, "expected UnknownKey for `atempts`, got: {errors:?}");
}

#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[checker]
attempts = "three"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, .. } if key.contains("attempts")
        )),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[delays]
telegram_min_secs = 90
telegram_max_secs = 30
"#;

    let errors = load_and_validate_str(toml).expect_err("inverted bounds should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { key, .. } if key == "delays.telegram_min_secs"
    )));
}

#[test]
fn diagnostic_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "bulk_pause".to_string(),
        section: "distribution".to_string(),
        suggestion: Some("bulk_pause_ms".to_string()),
        valid_keys: "default_platform, bulk_pause_ms".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `bulk_pause_ms`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("bulk_pause"));
}

#[test]
fn figment_dot_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: CourierConfig = Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string("[lead_reply]\nrate_limit_secs = 10\n"))
        .merge(("lead_reply.rate_limit_secs", 90))
        .extract()
        .expect("override should merge");

    assert_eq!(config.lead_reply.rate_limit_secs, 90);
}

/// `COURIER_*` variables override values from the file.
#[test]
#[serial]
fn env_vars_override_file_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[lead_reply]\nrate_limit_secs = 10").expect("write config");

    unsafe {
        std::env::set_var("COURIER_LEAD_REPLY_RATE_LIMIT_SECS", "45");
        std::env::set_var("COURIER_NOTIFICATIONS_TELEGRAM_BOT_TOKEN", "999:XYZ");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("COURIER_LEAD_REPLY_RATE_LIMIT_SECS");
        std::env::remove_var("COURIER_NOTIFICATIONS_TELEGRAM_BOT_TOKEN");
    }

    let config = result.expect("config should load");
    assert_eq!(config.lead_reply.rate_limit_secs, 45);
    assert_eq!(
        config.notifications.telegram_bot_token.as_deref(),
        Some("999:XYZ")
    );
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/courier.toml"))
        .expect("missing file is skipped");
    assert_eq!(config.service.name, "courier");
}
