// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender numbers, their per-platform accounts, quota reservation and bans.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use courier_core::{BanStatus, BanUpdate, CourierError, Platform, PlatformAccount, SenderPhoneNumber};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

type NumberRow = (String, bool, Option<String>, Option<String>);

fn load_accounts(
    conn: &Connection,
    phone_number: &str,
) -> rusqlite::Result<Vec<(String, PlatformAccount)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT platform, is_authenticated, daily_limit, total_limit,
                messages_sent_today, messages_sent_total,
                contacts_reached_today, contacts_reached_total
         FROM platform_accounts WHERE phone_number = ?1",
    )?;
    let rows = stmt.query_map(params![phone_number], |row| {
        Ok((
            row.get::<_, String>(0)?,
            PlatformAccount {
                is_authenticated: row.get(1)?,
                daily_limit: row.get(2)?,
                total_limit: row.get(3)?,
                messages_sent_today: row.get(4)?,
                messages_sent_total: row.get(5)?,
                contacts_reached_today: row.get(6)?,
                contacts_reached_total: row.get(7)?,
            },
        ))
    })?;
    rows.collect()
}

fn assemble(row: NumberRow, accounts: Vec<(String, PlatformAccount)>) -> SenderPhoneNumber {
    let (phone_number, is_banned, ban_status, ban_expires_at) = row;
    let mut number = SenderPhoneNumber::new(phone_number);
    number.is_banned = is_banned;
    number.ban_status = ban_status.and_then(|s| BanStatus::from_str(&s).ok());
    number.ban_expires_at = ban_expires_at.as_deref().and_then(parse_ts);
    for (platform, account) in accounts {
        if let Ok(platform) = Platform::from_str(&platform) {
            number = number.with_account(platform, account);
        }
    }
    number
}

/// Insert or replace a sender number together with all of its accounts.
///
/// Accounts not present on `number` are removed.
pub async fn upsert_phone_number(
    db: &Database,
    number: &SenderPhoneNumber,
) -> Result<(), CourierError> {
    let number = number.clone();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO phone_numbers
                    (phone_number, is_banned, ban_status, ban_expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(phone_number) DO UPDATE SET
                    is_banned = excluded.is_banned,
                    ban_status = excluded.ban_status,
                    ban_expires_at = excluded.ban_expires_at,
                    updated_at = excluded.updated_at",
                params![
                    number.phone_number,
                    number.is_banned,
                    number.ban_status.map(|s| s.to_string()),
                    number.ban_expires_at.map(format_ts),
                    now,
                ],
            )?;
            tx.execute(
                "DELETE FROM platform_accounts WHERE phone_number = ?1",
                params![number.phone_number],
            )?;
            for platform in Platform::ALL {
                if let Some(account) = number.account(platform) {
                    tx.execute(
                        "INSERT INTO platform_accounts
                            (phone_number, platform, is_authenticated, daily_limit, total_limit,
                             messages_sent_today, messages_sent_total,
                             contacts_reached_today, contacts_reached_total)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            number.phone_number,
                            platform.to_string(),
                            account.is_authenticated,
                            account.daily_limit,
                            account.total_limit,
                            account.messages_sent_today,
                            account.messages_sent_total,
                            account.contacts_reached_today,
                            account.contacts_reached_total,
                        ],
                    )?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_phone_number(
    db: &Database,
    phone_number: &str,
) -> Result<Option<SenderPhoneNumber>, CourierError> {
    let phone_number = phone_number.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<SenderPhoneNumber>, rusqlite::Error> {
            let row: Option<NumberRow> = conn
                .query_row(
                    "SELECT phone_number, is_banned, ban_status, ban_expires_at
                     FROM phone_numbers WHERE phone_number = ?1",
                    params![phone_number],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;
            match row {
                Some(row) => {
                    let accounts = load_accounts(conn, &row.0)?;
                    Ok(Some(assemble(row, accounts)))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Every sender number, ordered by phone number.
pub async fn list_phone_numbers(db: &Database) -> Result<Vec<SenderPhoneNumber>, CourierError> {
    db.connection()
        .call(|conn| -> Result<Vec<SenderPhoneNumber>, rusqlite::Error> {
            let rows: Vec<NumberRow> = {
                let mut stmt = conn.prepare(
                    "SELECT phone_number, is_banned, ban_status, ban_expires_at
                     FROM phone_numbers ORDER BY phone_number",
                )?;
                let mapped = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?;
                mapped.collect::<Result<_, _>>()?
            };
            rows.into_iter()
                .map(|row| {
                    let accounts = load_accounts(conn, &row.0)?;
                    Ok(assemble(row, accounts))
                })
                .collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Reserve quota for one send with a single conditional `UPDATE`.
///
/// The quota gate is `contacts_reached_today < daily_limit` (and the lifetime
/// cap when set). Returns `false` when no row qualified.
pub async fn reserve_send(
    db: &Database,
    phone_number: &str,
    platform: Platform,
    is_new_contact: bool,
) -> Result<bool, CourierError> {
    let phone_number = phone_number.to_string();
    let platform = platform.to_string();
    let contact_delta = i64::from(is_new_contact);
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE platform_accounts SET
                    messages_sent_today = messages_sent_today + 1,
                    messages_sent_total = messages_sent_total + 1,
                    contacts_reached_today = contacts_reached_today + ?3,
                    contacts_reached_total = contacts_reached_total + ?3
                 WHERE phone_number = ?1 AND platform = ?2
                   AND contacts_reached_today < daily_limit
                   AND (total_limit IS NULL OR contacts_reached_total < total_limit)",
                params![phone_number, platform, contact_delta],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Undo a reservation. Counters never drop below zero.
pub async fn release_send(
    db: &Database,
    phone_number: &str,
    platform: Platform,
    is_new_contact: bool,
) -> Result<(), CourierError> {
    let phone_number = phone_number.to_string();
    let platform = platform.to_string();
    let contact_delta = i64::from(is_new_contact);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE platform_accounts SET
                    messages_sent_today = MAX(messages_sent_today - 1, 0),
                    messages_sent_total = MAX(messages_sent_total - 1, 0),
                    contacts_reached_today = MAX(contacts_reached_today - ?3, 0),
                    contacts_reached_total = MAX(contacts_reached_total - ?3, 0)
                 WHERE phone_number = ?1 AND platform = ?2",
                params![phone_number, platform, contact_delta],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a ban. Returns whether the number exists.
pub async fn update_ban_status(
    db: &Database,
    phone_number: &str,
    ban: &BanUpdate,
) -> Result<bool, CourierError> {
    let phone_number = phone_number.to_string();
    let status = ban.status.to_string();
    let expires_at = ban.expires_at.map(format_ts);
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE phone_numbers SET
                    is_banned = 1, ban_status = ?2, ban_expires_at = ?3, updated_at = ?4
                 WHERE phone_number = ?1",
                params![phone_number, status, expires_at, now],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Zero every `*_today` counter and lift bans that expired before `now`.
///
/// Returns the number of accounts reset.
pub async fn reset_daily_counters(db: &Database, now: DateTime<Utc>) -> Result<usize, CourierError> {
    let now = format_ts(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let reset = tx.execute(
                "UPDATE platform_accounts SET messages_sent_today = 0, contacts_reached_today = 0",
                [],
            )?;
            tx.execute(
                "UPDATE phone_numbers SET
                    is_banned = 0, ban_status = NULL, ban_expires_at = NULL, updated_at = ?1
                 WHERE is_banned = 1 AND ban_expires_at IS NOT NULL AND ban_expires_at <= ?1",
                params![now],
            )?;
            tx.commit()?;
            Ok(reset)
        })
        .await
        .map_err(map_tr_err)
}
