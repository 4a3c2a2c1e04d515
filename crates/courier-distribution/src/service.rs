// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message distribution entry points.
//!
//! `MessageDistributionService` ties platform choice, sender rotation and the
//! senders together:
//!
//! - [`distribute_message`](MessageDistributionService::distribute_message):
//!   one recipient, every reachable platform in priority order.
//! - [`bulk_distribute`](MessageDistributionService::bulk_distribute):
//!   a contact list, strictly sequential, with a summary report.
//! - [`send_message_to_lead`](MessageDistributionService::send_message_to_lead):
//!   rate-limited auto-reply to an inbound lead.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use courier_config::CourierConfig;
use courier_core::{
    BulkDetail, BulkSummary, CampaignRepository, CheckMode, Clock, ContactStatus, CourierError,
    DeliveryOutcome, DistributionReport, Lead, Platform, SendError, phone,
};
use courier_platform::MessagingPlatformChecker;
use courier_sender::MessageSender;

use crate::metrics;
use crate::rate_limit::RateLimiter;
use crate::rotation::PhoneNumberManager;

/// What happened to an inbound lead's auto-reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum LeadReplyOutcome {
    /// A reply to this lead went out inside the rate-limit window.
    RateLimited,
    /// The operator has no active campaign.
    NoActiveCampaign,
    /// The active campaign has no message.
    NoMessage,
    Delivered(DistributionReport),
}

pub struct MessageDistributionService {
    campaigns: Arc<dyn CampaignRepository>,
    checker: Arc<MessagingPlatformChecker>,
    rotation: Arc<PhoneNumberManager>,
    sender: Arc<MessageSender>,
    lead_replies: RateLimiter,
    bulk_pause: Duration,
}

impl MessageDistributionService {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        checker: Arc<MessagingPlatformChecker>,
        rotation: Arc<PhoneNumberManager>,
        sender: Arc<MessageSender>,
        clock: Arc<dyn Clock>,
        config: &CourierConfig,
    ) -> Self {
        Self {
            campaigns,
            checker,
            rotation,
            sender,
            lead_replies: RateLimiter::new(config.lead_reply.rate_limit(), clock),
            bulk_pause: config.distribution.bulk_pause(),
        }
    }

    pub fn rotation(&self) -> &Arc<PhoneNumberManager> {
        &self.rotation
    }

    pub fn checker(&self) -> &Arc<MessagingPlatformChecker> {
        &self.checker
    }

    /// Distribute one message to one recipient.
    ///
    /// `message` falls back to the campaign's message when absent or blank.
    /// Only precondition violations and infrastructure faults are returned as
    /// errors; per-platform failures are recorded in the report. An empty
    /// report means the recipient was reachable on no platform.
    pub async fn distribute_message(
        &self,
        campaign_id: &str,
        message: Option<&str>,
        phone_number: &str,
        platform_priority: Option<&str>,
        mode: CheckMode,
    ) -> Result<DistributionReport, CourierError> {
        let recipient = phone::normalize(phone_number)?;
        let campaign = self
            .campaigns
            .get_campaign_by_id(campaign_id)
            .await?
            .ok_or_else(|| CourierError::CampaignNotFound(campaign_id.to_string()))?;
        if self
            .campaigns
            .get_campaign_phone_numbers(campaign_id)
            .await?
            .is_empty()
        {
            return Err(CourierError::NoSenderNumbers(campaign_id.to_string()));
        }
        let text = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| campaign.message_text())
            .ok_or_else(|| CourierError::EmptyMessage(campaign_id.to_string()))?;

        let platforms = self
            .checker
            .choose_platform(campaign_id, &recipient, platform_priority, mode)
            .await?;

        let mut report = DistributionReport::default();
        for platform in platforms {
            let outcome = self
                .distribute_on(platform, campaign_id, &recipient, text)
                .await;
            metrics::record_send(platform, outcome.as_ref());
            report.results.push((platform, outcome));
        }

        info!(
            campaign_id,
            %recipient,
            delivered = ?report.successful_platforms(),
            "distribution finished"
        );
        Ok(report)
    }

    /// One platform: send from the pinned sender, rotating on `DAILY_LIMIT_REACHED`.
    ///
    /// Each attached number is tried at most once. `None` means no sender
    /// number was available at all.
    async fn distribute_on(
        &self,
        platform: Platform,
        campaign_id: &str,
        recipient: &str,
        text: &str,
    ) -> Option<DeliveryOutcome> {
        let first = match self
            .rotation
            .get_next_available_phone_number(campaign_id, platform)
            .await
        {
            Ok(Some(sender)) => sender,
            Ok(None) => {
                warn!(campaign_id, %platform, "no available sender number, skipping platform");
                return None;
            }
            Err(e) => {
                warn!(campaign_id, %platform, error = %e, "sender lookup failed");
                return Some(DeliveryOutcome::Failed {
                    sender: None,
                    error: SendError::Provider(e.to_string()),
                });
            }
        };

        let mut sender = first;
        let mut tried = HashSet::new();
        loop {
            tried.insert(sender.clone());
            let error = match self
                .sender
                .send(platform, campaign_id, &sender, recipient, text)
                .await
            {
                Ok(receipt) => return Some(DeliveryOutcome::from(Ok::<_, SendError>(receipt))),
                Err(error) => error,
            };
            if !error.triggers_rotation() {
                return Some(DeliveryOutcome::Failed {
                    sender: Some(sender),
                    error,
                });
            }

            match self
                .rotation
                .switch_to_next_phone_number(campaign_id, &sender, platform)
                .await
            {
                Ok(Some(next)) if !tried.contains(&next) => {
                    debug!(campaign_id, %platform, from = %sender, to = %next, "retrying with next sender");
                    sender = next;
                }
                Ok(_) => {
                    return Some(DeliveryOutcome::Failed {
                        sender: Some(sender),
                        error,
                    });
                }
                Err(e) => {
                    warn!(campaign_id, %platform, error = %e, "sender rotation failed");
                    return Some(DeliveryOutcome::Failed {
                        sender: Some(sender),
                        error,
                    });
                }
            }
        }
    }

    /// Distribute to every contact in order, one at a time.
    ///
    /// `message` and `platform_priority` default to the campaign's own. A
    /// contact that fails, for whatever reason, is recorded and the batch
    /// moves on.
    pub async fn bulk_distribute(
        &self,
        campaign_id: &str,
        contacts: &[String],
        message: Option<&str>,
        platform_priority: Option<&str>,
        mode: CheckMode,
    ) -> Result<BulkSummary, CourierError> {
        let campaign = self
            .campaigns
            .get_campaign_by_id(campaign_id)
            .await?
            .ok_or_else(|| CourierError::CampaignNotFound(campaign_id.to_string()))?;
        let message = message.or(campaign.message.as_deref());
        let priority = platform_priority.unwrap_or(campaign.platform_priority.as_str());

        info!(campaign_id, contacts = contacts.len(), %priority, %mode, "bulk distribution started");
        let mut summary = BulkSummary {
            total_contacts: contacts.len(),
            ..BulkSummary::default()
        };

        for (index, contact) in contacts.iter().enumerate() {
            if index > 0 && !self.bulk_pause.is_zero() {
                tokio::time::sleep(self.bulk_pause).await;
            }

            let detail = match self
                .distribute_message(campaign_id, message, contact, Some(priority), mode)
                .await
            {
                Ok(report) if report.any_success() => BulkDetail {
                    phone_number: contact.clone(),
                    status: ContactStatus::Success,
                    platforms: report.successful_platforms(),
                    error: None,
                },
                Ok(report) => BulkDetail {
                    phone_number: contact.clone(),
                    status: ContactStatus::Failed,
                    platforms: Vec::new(),
                    error: Some(failure_reason(&report)),
                },
                Err(e) => {
                    warn!(campaign_id, contact = %contact, error = %e, "contact failed");
                    BulkDetail {
                        phone_number: contact.clone(),
                        status: ContactStatus::Failed,
                        platforms: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };

            metrics::record_bulk_contact(detail.status);
            match detail.status {
                ContactStatus::Success => summary.successful_sends += 1,
                ContactStatus::Failed => summary.failed_sends += 1,
            }
            summary.details.push(detail);
        }

        info!(
            campaign_id,
            total = summary.total_contacts,
            successful = summary.successful_sends,
            failed = summary.failed_sends,
            "bulk distribution finished"
        );
        Ok(summary)
    }

    /// Auto-reply to an inbound lead with the operator's active campaign.
    pub async fn send_message_to_lead(
        &self,
        lead: &Lead,
        user_id: &str,
    ) -> Result<LeadReplyOutcome, CourierError> {
        let lead_phone = phone::normalize(&lead.phone_number)?;
        if !self.lead_replies.try_acquire(&lead_phone, user_id) {
            debug!(lead = %lead_phone, user_id, "lead reply rate limited");
            return Ok(LeadReplyOutcome::RateLimited);
        }
        self.lead_replies.purge_expired();

        let Some(campaign) = self.campaigns.get_active_campaign(user_id).await? else {
            info!(user_id, "no active campaign, lead not answered");
            return Ok(LeadReplyOutcome::NoActiveCampaign);
        };
        if campaign.message_text().is_none() {
            info!(user_id, campaign_id = %campaign.id, "active campaign has no message");
            return Ok(LeadReplyOutcome::NoMessage);
        }

        let report = self
            .distribute_message(&campaign.id, None, &lead_phone, None, CheckMode::One)
            .await?;
        Ok(LeadReplyOutcome::Delivered(report))
    }

    /// Stop background work and release platform sessions.
    pub async fn shutdown(&self) {
        self.checker.shutdown().await;
    }
}

fn failure_reason(report: &DistributionReport) -> String {
    match report.first_error() {
        Some(error) => error.to_string(),
        None if report.is_empty() => "recipient is not reachable on any platform".to_string(),
        None => "no available sender number".to_string(),
    }
}
