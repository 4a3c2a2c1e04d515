// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every violation instead of failing on the first one.

use courier_core::{Platform, PlatformSet, phone};

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(
            "service.log_level",
            format!(
                "`{}` is not one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if config.checker.attempts == 0 {
        errors.push(ConfigError::validation(
            "checker.attempts",
            "must be at least 1",
        ));
    }

    if config.checker.cleanup_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "checker.cleanup_interval_secs",
            "must be greater than zero",
        ));
    }

    for platform in Platform::ALL {
        let (min, max) = config.delays.bounds(platform);
        if min > max {
            errors.push(ConfigError::validation(
                format!("delays.{platform}_min_secs"),
                format!("{min} exceeds {platform}_max_secs ({max})"),
            ));
        }
    }

    if config
        .distribution
        .default_platform
        .parse::<PlatformSet>()
        .is_err()
    {
        errors.push(ConfigError::validation(
            "distribution.default_platform",
            format!(
                "`{}` is not a platform token",
                config.distribution.default_platform
            ),
        ));
    }

    if config.waba.access_token.is_some() && config.waba.phone_number_ids.is_empty() {
        errors.push(ConfigError::validation(
            "waba.phone_number_ids",
            "an access token is set but no sender numbers are mapped",
        ));
    }

    for number in config.waba.phone_number_ids.keys() {
        if phone::normalize(number).is_err() {
            errors.push(ConfigError::validation(
                "waba.phone_number_ids",
                format!("`{number}` is not a valid phone number"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
