// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign CRUD, sender attachment and activation.

use std::str::FromStr;

use chrono::Utc;
use courier_core::{Campaign, CampaignPhoneNumber, CourierError, Platform};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_ts, map_tr_err};

const CAMPAIGN_COLUMNS: &str =
    "id, user_id, message, platform_priority, is_active, notification_telegram_ids";

fn row_to_campaign(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    let ids: String = row.get(5)?;
    Ok(Campaign {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        platform_priority: row.get(3)?,
        is_active: row.get(4)?,
        notification_telegram_ids: serde_json::from_str(&ids).unwrap_or_default(),
    })
}

/// Why an activation was refused.
enum ActivationCheck {
    Ok,
    Missing,
    EmptyMessage,
    NoAuthenticatedNumber,
}

/// Insert or replace a campaign's own fields. Attachments are untouched.
pub async fn upsert_campaign(db: &Database, campaign: &Campaign) -> Result<(), CourierError> {
    let campaign = campaign.clone();
    let ids = serde_json::to_string(&campaign.notification_telegram_ids)
        .map_err(|e| CourierError::Internal(e.to_string()))?;
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaigns
                    (id, user_id, message, platform_priority, is_active,
                     notification_telegram_ids, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    message = excluded.message,
                    platform_priority = excluded.platform_priority,
                    is_active = excluded.is_active,
                    notification_telegram_ids = excluded.notification_telegram_ids,
                    updated_at = excluded.updated_at",
                params![
                    campaign.id,
                    campaign.user_id,
                    campaign.message,
                    campaign.platform_priority,
                    campaign.is_active,
                    ids,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_campaign(db: &Database, id: &str) -> Result<Option<Campaign>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"),
                params![id],
                row_to_campaign,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The operator's active campaign, most recently activated first.
pub async fn get_active_campaign(
    db: &Database,
    user_id: &str,
) -> Result<Option<Campaign>, CourierError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
                     WHERE user_id = ?1 AND is_active = 1
                     ORDER BY activated_at DESC
                     LIMIT 1"
                ),
                params![user_id],
                row_to_campaign,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_platform_priority(
    db: &Database,
    id: &str,
) -> Result<Option<String>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT platform_priority FROM campaigns WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Attached sender numbers in attach order. Rows with an unknown platform are skipped.
pub async fn get_campaign_phone_numbers(
    db: &Database,
    campaign_id: &str,
) -> Result<Vec<CampaignPhoneNumber>, CourierError> {
    let campaign_id = campaign_id.to_string();
    let rows: Vec<(String, String)> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT phone_number, platform FROM campaign_phone_numbers
                 WHERE campaign_id = ?1
                 ORDER BY position ASC",
            )?;
            let rows = stmt.query_map(params![campaign_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    Ok(rows
        .into_iter()
        .filter_map(|(phone_number, platform)| {
            Platform::from_str(&platform)
                .ok()
                .map(|platform| CampaignPhoneNumber {
                    phone_number,
                    platform,
                })
        })
        .collect())
}

/// Attach a sender number to a campaign for `platform`, at the end of the order.
///
/// Attaching an already attached pair keeps its original position.
pub async fn attach_phone_number(
    db: &Database,
    campaign_id: &str,
    phone_number: &str,
    platform: Platform,
) -> Result<(), CourierError> {
    let campaign_id = campaign_id.to_string();
    let phone_number = phone_number.to_string();
    let platform = platform.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO campaign_phone_numbers
                    (campaign_id, phone_number, platform, position)
                 VALUES (?1, ?2, ?3,
                    (SELECT COALESCE(MAX(position), -1) + 1
                     FROM campaign_phone_numbers WHERE campaign_id = ?1))",
                params![campaign_id, phone_number, platform],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Detach a sender number. Returns whether anything was removed.
pub async fn detach_phone_number(
    db: &Database,
    campaign_id: &str,
    phone_number: &str,
    platform: Platform,
) -> Result<bool, CourierError> {
    let campaign_id = campaign_id.to_string();
    let phone_number = phone_number.to_string();
    let platform = platform.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM campaign_phone_numbers
                 WHERE campaign_id = ?1 AND phone_number = ?2 AND platform = ?3",
                params![campaign_id, phone_number, platform],
            )?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Activate a campaign, deactivating the owner's other campaigns.
///
/// Refused unless the campaign has a non-blank message and at least one
/// attached number with an authenticated account on the attached platform.
pub async fn activate_campaign(db: &Database, id: &str) -> Result<(), CourierError> {
    let campaign_id = id.to_string();
    let now = format_ts(Utc::now());
    let check = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let row: Option<(String, Option<String>)> = tx
                .query_row(
                    "SELECT user_id, message FROM campaigns WHERE id = ?1",
                    params![campaign_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((user_id, message)) = row else {
                return Ok(ActivationCheck::Missing);
            };
            if message.as_deref().is_none_or(|m| m.trim().is_empty()) {
                return Ok(ActivationCheck::EmptyMessage);
            }

            let authenticated: i64 = tx.query_row(
                "SELECT COUNT(*) FROM campaign_phone_numbers c
                 JOIN platform_accounts a
                   ON a.phone_number = c.phone_number AND a.platform = c.platform
                 WHERE c.campaign_id = ?1 AND a.is_authenticated = 1",
                params![campaign_id],
                |row| row.get(0),
            )?;
            if authenticated == 0 {
                return Ok(ActivationCheck::NoAuthenticatedNumber);
            }

            tx.execute(
                "UPDATE campaigns SET is_active = 0, updated_at = ?2
                 WHERE user_id = ?1 AND is_active = 1",
                params![user_id, now],
            )?;
            tx.execute(
                "UPDATE campaigns SET is_active = 1, activated_at = ?2, updated_at = ?2
                 WHERE id = ?1",
                params![campaign_id, now],
            )?;
            tx.commit()?;
            Ok(ActivationCheck::Ok)
        })
        .await
        .map_err(map_tr_err)?;

    match check {
        ActivationCheck::Ok => Ok(()),
        ActivationCheck::Missing => Err(CourierError::CampaignNotFound(id.to_string())),
        ActivationCheck::EmptyMessage => Err(CourierError::EmptyMessage(id.to_string())),
        ActivationCheck::NoAuthenticatedNumber => {
            Err(CourierError::NoSenderNumbers(id.to_string()))
        }
    }
}

pub async fn deactivate_campaign(db: &Database, id: &str) -> Result<(), CourierError> {
    let id = id.to_string();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE campaigns SET is_active = 0, updated_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
