// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead records and reachability status.

use std::str::FromStr;

use chrono::Utc;
use courier_core::{CourierError, Lead, LeadStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};

/// Insert a lead or refresh its name. An existing status is kept.
pub async fn upsert_lead(db: &Database, lead: &Lead) -> Result<(), CourierError> {
    let lead = lead.clone();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (phone_number, name, status, updated_at)
                 VALUES (?1, ?2, 'NEW', ?3)
                 ON CONFLICT(phone_number) DO UPDATE SET
                    name = COALESCE(excluded.name, leads.name),
                    updated_at = excluded.updated_at",
                params![lead.phone_number, lead.name, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Set a lead's status, creating the lead when unknown.
pub async fn set_lead_status(
    db: &Database,
    phone_number: &str,
    status: LeadStatus,
) -> Result<(), CourierError> {
    let phone_number = phone_number.to_string();
    let status = status.to_string();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (phone_number, status, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(phone_number) DO UPDATE SET
                    status = excluded.status,
                    updated_at = excluded.updated_at",
                params![phone_number, status, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_lead_status(
    db: &Database,
    phone_number: &str,
) -> Result<Option<LeadStatus>, CourierError> {
    let phone_number = phone_number.to_string();
    let status: Option<String> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT status FROM leads WHERE phone_number = ?1",
                params![phone_number],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(status.and_then(|s| LeadStatus::from_str(&s).ok()))
}
