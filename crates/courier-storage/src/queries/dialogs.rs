// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialog history written after every successful send.

use courier_core::{CourierError, Platform};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// A stored dialog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRecord {
    pub user_id: String,
    pub contact_id: String,
    pub recipient_phone: String,
    pub platform: String,
    pub request: String,
    pub response: String,
}

pub async fn insert_dialog(db: &Database, record: DialogRecord) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO dialogs
                    (user_id, contact_id, recipient_phone, platform, request, response)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.user_id,
                    record.contact_id,
                    record.recipient_phone,
                    record.platform,
                    record.request,
                    record.response,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Whether the operator has any dialog with the recipient on `platform`.
pub async fn has_dialog(
    db: &Database,
    user_id: &str,
    recipient_phone: &str,
    platform: Platform,
) -> Result<bool, CourierError> {
    let user_id = user_id.to_string();
    let recipient_phone = recipient_phone.to_string();
    let platform = platform.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM dialogs
                    WHERE user_id = ?1 AND recipient_phone = ?2 AND platform = ?3)",
                params![user_id, recipient_phone, platform],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Dialogs of an operator, oldest first.
pub async fn list_dialogs(db: &Database, user_id: &str) -> Result<Vec<DialogRecord>, CourierError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, contact_id, recipient_phone, platform, request, response
                 FROM dialogs WHERE user_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(DialogRecord {
                    user_id: row.get(0)?,
                    contact_id: row.get(1)?,
                    recipient_phone: row.get(2)?,
                    platform: row.get(3)?,
                    request: row.get(4)?,
                    response: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
