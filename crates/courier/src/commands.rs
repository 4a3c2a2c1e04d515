// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations. Each returns the JSON document to print.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

use courier_core::{CheckMode, CourierError, DistributionReport, SenderPhoneNumber};

use crate::app::App;
use crate::contacts;

/// Per-platform results keyed by platform token.
///
/// Platforms that were selected but had no sender number map to `null`.
pub fn report_json(report: &DistributionReport) -> Result<Value, CourierError> {
    let mut results = Map::new();
    for (platform, outcome) in &report.results {
        results.insert(platform.to_string(), to_json(outcome)?);
    }
    Ok(Value::Object(results))
}

pub async fn distribute(
    app: &App,
    campaign_id: &str,
    to: &str,
    message: Option<&str>,
    platform: Option<&str>,
    mode: CheckMode,
) -> Result<Value, CourierError> {
    let report = app
        .service
        .distribute_message(campaign_id, message, to, platform, mode)
        .await?;
    report_json(&report)
}

pub async fn bulk(
    app: &App,
    campaign_id: &str,
    contacts_file: &Path,
    message: Option<&str>,
    platform: Option<&str>,
    mode: CheckMode,
) -> Result<Value, CourierError> {
    let contacts = contacts::read_contacts(contacts_file)?;
    info!(campaign_id, contacts = contacts.len(), file = %contacts_file.display(), "contacts loaded");
    let summary = app
        .service
        .bulk_distribute(campaign_id, &contacts, message, platform, mode)
        .await?;
    to_json(&summary)
}

/// Pool status: every sender number with availability per configured account.
pub async fn numbers(app: &App) -> Result<Value, CourierError> {
    let now = Utc::now();
    let numbers = app.storage.list_phone_numbers().await?;
    let rows = numbers
        .iter()
        .map(|number| number_json(number, now))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(rows))
}

fn number_json(
    number: &SenderPhoneNumber,
    now: chrono::DateTime<Utc>,
) -> Result<Value, CourierError> {
    let mut value = to_json(number)?;
    let available: Map<String, Value> = courier_core::Platform::ALL
        .iter()
        .filter(|p| number.account(**p).is_some())
        .map(|p| (p.to_string(), Value::Bool(number.is_available_on(*p, now))))
        .collect();
    if let Value::Object(fields) = &mut value {
        fields.insert("available".into(), Value::Object(available));
    }
    Ok(value)
}

pub async fn reset_daily(app: &App) -> Result<Value, CourierError> {
    let reset = app.storage.reset_daily_counters(Utc::now()).await?;
    info!(accounts = reset, "daily counters reset");
    Ok(json!({ "reset_accounts": reset }))
}

pub async fn activate(app: &App, campaign_id: &str) -> Result<Value, CourierError> {
    app.storage.activate_campaign(campaign_id).await?;
    Ok(json!({ "campaign_id": campaign_id, "active": true }))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CourierError> {
    serde_json::to_value(value).map_err(|e| CourierError::Internal(format!("cannot encode output: {e}")))
}
