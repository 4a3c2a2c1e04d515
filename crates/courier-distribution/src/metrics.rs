// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is exported unless the host installs
//! a recorder.

use metrics::describe_counter;

use courier_core::{ContactStatus, DeliveryOutcome, Platform, SendError};

/// Register all Courier metric descriptions.
pub fn register_metrics() {
    describe_counter!("courier_sends_total", "Send attempts by platform and outcome");
    describe_counter!(
        "courier_rotations_total",
        "Sender number rotations by platform and result"
    );
    describe_counter!(
        "courier_bulk_contacts_total",
        "Contacts processed by bulk distribution"
    );
}

/// Record the final outcome of one platform's attempt.
pub fn record_send(platform: Platform, outcome: Option<&DeliveryOutcome>) {
    let outcome = match outcome {
        Some(DeliveryOutcome::Delivered { .. }) => "delivered",
        Some(DeliveryOutcome::Failed { error, .. }) => match error {
            SendError::DailyLimitReached => "daily_limit_reached",
            SendError::CampaignIdUndefined | SendError::CampaignNotFound => "campaign_error",
            SendError::ClientNotAuthorized => "client_not_authorized",
            SendError::RecipientNotFound => "recipient_not_found",
            SendError::FloodWait { .. } => "flood_wait",
            SendError::Provider(_) => "provider_error",
        },
        None => "skipped",
    };
    metrics::counter!(
        "courier_sends_total",
        "platform" => platform.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rotation attempt; `switched` is false on exhaustion.
pub fn record_rotation(platform: Platform, switched: bool) {
    let result = if switched { "switched" } else { "exhausted" };
    metrics::counter!(
        "courier_rotations_total",
        "platform" => platform.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_bulk_contact(status: ContactStatus) {
    metrics::counter!("courier_bulk_contacts_total", "status" => status.to_string()).increment(1);
}
