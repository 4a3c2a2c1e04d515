// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across collaborator traits and the Courier services.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{CourierError, SendError};

/// Unique identifier for a message delivered by a messenger provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// A concrete messenger platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    WhatsApp,
    Waba,
}

impl Platform {
    /// All concrete platforms, in priority order.
    pub const ALL: [Platform; 3] = [Platform::Telegram, Platform::WhatsApp, Platform::Waba];
}

/// A campaign's platform priority: one platform or a composite pair.
///
/// Composite tokens name both members explicitly so that nothing downstream
/// has to guess which of the two platforms a campaign meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformSet {
    Single(Platform),
    Pair(Platform, Platform),
}

impl PlatformSet {
    /// `tgwa`: Telegram then WhatsApp.
    pub const TG_WA: PlatformSet = PlatformSet::Pair(Platform::Telegram, Platform::WhatsApp);
    /// `tgwaba`: Telegram then WhatsApp Business.
    pub const TG_WABA: PlatformSet = PlatformSet::Pair(Platform::Telegram, Platform::Waba);

    /// Concrete platforms in attempt order.
    pub fn members(&self) -> Vec<Platform> {
        match *self {
            PlatformSet::Single(p) => vec![p],
            PlatformSet::Pair(a, b) => vec![a, b],
        }
    }

    /// The stable token for this set (`telegram`, `tgwa`, ...).
    pub fn token(&self) -> &'static str {
        match *self {
            PlatformSet::Single(Platform::Telegram) => "telegram",
            PlatformSet::Single(Platform::WhatsApp) => "whatsapp",
            PlatformSet::Single(Platform::Waba) => "waba",
            PlatformSet::Pair(Platform::Telegram, Platform::WhatsApp) => "tgwa",
            PlatformSet::Pair(Platform::Telegram, Platform::Waba) => "tgwaba",
            PlatformSet::Pair(_, _) => "custom",
        }
    }

    /// Parse a token, returning `None` for anything outside the accepted set.
    pub fn parse_token(token: &str) -> Option<PlatformSet> {
        token.parse().ok()
    }
}

impl From<Platform> for PlatformSet {
    fn from(platform: Platform) -> Self {
        PlatformSet::Single(platform)
    }
}

impl FromStr for PlatformSet {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tgwa" => Ok(PlatformSet::TG_WA),
            "tgwaba" => Ok(PlatformSet::TG_WABA),
            other => Platform::from_str(other)
                .map(PlatformSet::Single)
                .map_err(|_| CourierError::UnsupportedPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for PlatformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformSet::Pair(a, b) if self.token() == "custom" => write!(f, "{a},{b}"),
            _ => f.write_str(self.token()),
        }
    }
}

/// Checking mode requested by the caller.
///
/// Accepted and logged for intent; it does not change how platforms are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    #[default]
    One,
    Both,
}

/// Classified ban state of a phone number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BanStatus {
    UserDeactivated,
    UserBanned,
    PrivacyRestricted,
    FloodWait,
    Restricted,
}

impl BanStatus {
    /// Whether a lookup or send failing with this status describes the peer
    /// rather than the sending account.
    pub fn concerns_peer(self) -> bool {
        matches!(
            self,
            BanStatus::UserDeactivated | BanStatus::UserBanned | BanStatus::PrivacyRestricted
        )
    }
}

/// A ban write-back produced by classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanUpdate {
    pub status: BanStatus,
    /// `None` means the ban does not expire on its own.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Per-platform account attached to a sender number, with its quota counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub is_authenticated: bool,
    pub daily_limit: u32,
    /// `None` means no lifetime cap.
    pub total_limit: Option<u32>,
    pub messages_sent_today: u32,
    pub messages_sent_total: u32,
    pub contacts_reached_today: u32,
    pub contacts_reached_total: u32,
}

impl PlatformAccount {
    /// A fresh, authenticated account with the given daily limit.
    pub fn authenticated(daily_limit: u32) -> Self {
        Self {
            is_authenticated: true,
            daily_limit,
            total_limit: None,
            messages_sent_today: 0,
            messages_sent_total: 0,
            contacts_reached_today: 0,
            contacts_reached_total: 0,
        }
    }

    /// Whether the account still has quota for another contact today.
    pub fn has_quota(&self) -> bool {
        let under_total = self
            .total_limit
            .is_none_or(|limit| self.contacts_reached_total < limit);
        self.contacts_reached_today < self.daily_limit && under_total
    }
}

/// An operator-owned phone number used to originate outbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderPhoneNumber {
    pub phone_number: String,
    pub is_banned: bool,
    pub ban_status: Option<BanStatus>,
    pub ban_expires_at: Option<DateTime<Utc>>,
    pub telegram_account: Option<PlatformAccount>,
    pub whatsapp_account: Option<PlatformAccount>,
    pub waba_account: Option<PlatformAccount>,
}

impl SenderPhoneNumber {
    /// A number with no accounts and no ban.
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            is_banned: false,
            ban_status: None,
            ban_expires_at: None,
            telegram_account: None,
            whatsapp_account: None,
            waba_account: None,
        }
    }

    /// Attach an account for `platform`, replacing any existing one.
    pub fn with_account(mut self, platform: Platform, account: PlatformAccount) -> Self {
        *self.account_slot(platform) = Some(account);
        self
    }

    pub fn account(&self, platform: Platform) -> Option<&PlatformAccount> {
        match platform {
            Platform::Telegram => self.telegram_account.as_ref(),
            Platform::WhatsApp => self.whatsapp_account.as_ref(),
            Platform::Waba => self.waba_account.as_ref(),
        }
    }

    pub fn account_mut(&mut self, platform: Platform) -> Option<&mut PlatformAccount> {
        self.account_slot(platform).as_mut()
    }

    fn account_slot(&mut self, platform: Platform) -> &mut Option<PlatformAccount> {
        match platform {
            Platform::Telegram => &mut self.telegram_account,
            Platform::WhatsApp => &mut self.whatsapp_account,
            Platform::Waba => &mut self.waba_account,
        }
    }

    /// Whether a ban is in force at `now`. Expired bans do not count.
    pub fn is_ban_active(&self, now: DateTime<Utc>) -> bool {
        if !self.is_banned {
            return false;
        }
        match self.ban_expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }

    /// Whether this number can send on `platform` at `now`: not banned,
    /// authenticated on the platform, and under quota.
    pub fn is_available_on(&self, platform: Platform, now: DateTime<Utc>) -> bool {
        if self.is_ban_active(now) {
            return false;
        }
        match self.account(platform) {
            Some(account) => account.is_authenticated && account.has_quota(),
            None => false,
        }
    }
}

/// A mailing campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    /// The owning operator.
    pub user_id: String,
    pub message: Option<String>,
    /// Raw platform token as stored; may be invalid.
    pub platform_priority: String,
    pub is_active: bool,
    pub notification_telegram_ids: Vec<i64>,
}

impl Campaign {
    /// The message text, if present and non-blank.
    pub fn message_text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// A sender number attached to a campaign for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignPhoneNumber {
    pub phone_number: String,
    pub platform: Platform,
}

/// An inbound lead that may receive an automatic reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub phone_number: String,
    pub name: Option<String>,
}

/// Reachability status recorded for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Unavailable,
}

/// A successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: MessageId,
    pub sender: String,
    pub platform: Platform,
}

/// Final outcome of one platform's attempt for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Delivered {
        sender: String,
        message_id: MessageId,
    },
    Failed {
        sender: Option<String>,
        error: SendError,
    },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn error(&self) -> Option<&SendError> {
        match self {
            DeliveryOutcome::Failed { error, .. } => Some(error),
            DeliveryOutcome::Delivered { .. } => None,
        }
    }
}

impl From<Result<SendReceipt, SendError>> for DeliveryOutcome {
    fn from(result: Result<SendReceipt, SendError>) -> Self {
        match result {
            Ok(receipt) => DeliveryOutcome::Delivered {
                sender: receipt.sender,
                message_id: receipt.message_id,
            },
            Err(error) => DeliveryOutcome::Failed {
                sender: None,
                error,
            },
        }
    }
}

/// Per-platform results for one recipient.
///
/// A platform that was selected but skipped (no sender number) is present
/// with `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub results: Vec<(Platform, Option<DeliveryOutcome>)>,
}

impl DistributionReport {
    /// The result recorded for `platform`, if the platform was selected at all.
    pub fn get(&self, platform: Platform) -> Option<&Option<DeliveryOutcome>> {
        self.results
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, outcome)| outcome)
    }

    /// The outcome for `platform`, flattening "skipped" and "not selected".
    pub fn outcome(&self, platform: Platform) -> Option<&DeliveryOutcome> {
        self.get(platform).and_then(Option::as_ref)
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.get(platform).is_some()
    }

    /// Whether no platform was selected (the recipient was unreachable).
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether any platform delivered the message.
    pub fn any_success(&self) -> bool {
        self.results
            .iter()
            .any(|(_, outcome)| outcome.as_ref().is_some_and(DeliveryOutcome::is_success))
    }

    /// Platforms that delivered the message.
    pub fn successful_platforms(&self) -> Vec<Platform> {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.as_ref().is_some_and(DeliveryOutcome::is_success))
            .map(|(p, _)| *p)
            .collect()
    }

    /// The first recorded error, if any.
    pub fn first_error(&self) -> Option<&SendError> {
        self.results
            .iter()
            .filter_map(|(_, outcome)| outcome.as_ref().and_then(DeliveryOutcome::error))
            .next()
    }
}

/// Status of one contact in a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Success,
    Failed,
}

/// One row of a bulk distribution report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDetail {
    pub phone_number: String,
    pub status: ContactStatus,
    /// Platforms that delivered, on success.
    pub platforms: Vec<Platform>,
    /// Failure description, on failure.
    pub error: Option<String>,
}

/// Aggregated result of a bulk distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total_contacts: usize,
    pub successful_sends: usize,
    pub failed_sends: usize,
    pub details: Vec<BulkDetail>,
}
