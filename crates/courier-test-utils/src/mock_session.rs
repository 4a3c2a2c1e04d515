// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messenger sessions.
//!
//! `MockSessionProvider` hands out sessions that share one scripted state:
//! which senders are authorized, which recipients have no account, and a
//! queue of failures for the next lookups and sends. Every delivered message
//! is captured for assertions.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use courier_core::{
    CourierError, MessageId, MessengerSession, Platform, SessionProvider, phone,
};

/// A message captured by a mock session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub sender: String,
    pub contact_id: String,
    pub text: String,
}

#[derive(Default)]
struct Script {
    unauthorized: HashSet<String>,
    unreachable: HashSet<String>,
    lookup_failures: VecDeque<String>,
    send_failures: VecDeque<String>,
    lookups: usize,
    disconnects: usize,
    sent: Vec<SentMessage>,
}

pub struct MockSessionProvider {
    platform: Platform,
    script: Arc<Mutex<Script>>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Normalize whatever shape a provider receives back to `+<digits>`.
fn canonical(recipient: &str) -> String {
    let bare = recipient.strip_suffix("@c.us").unwrap_or(recipient);
    phone::normalize(bare).unwrap_or_else(|_| bare.to_string())
}

impl MockSessionProvider {
    /// A provider whose senders are all authorized and whose recipients all exist.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn set_authorized(&self, sender: &str, authorized: bool) {
        let mut script = lock(&self.script);
        if authorized {
            script.unauthorized.remove(sender);
        } else {
            script.unauthorized.insert(sender.to_string());
        }
    }

    /// Make `recipient` resolve to no account.
    pub fn set_unreachable(&self, recipient: &str) {
        lock(&self.script).unreachable.insert(canonical(recipient));
    }

    /// Fail the next lookups with these provider messages, in order.
    pub fn fail_next_lookups<I, S>(&self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.script)
            .lookup_failures
            .extend(messages.into_iter().map(Into::into));
    }

    /// Fail the next sends with these provider messages, in order.
    pub fn fail_next_sends<I, S>(&self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.script)
            .send_failures
            .extend(messages.into_iter().map(Into::into));
    }

    pub fn lookup_count(&self) -> usize {
        lock(&self.script).lookups
    }

    pub fn disconnect_count(&self) -> usize {
        lock(&self.script).disconnects
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.script).sent.clone()
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn session(&self, sender: &str) -> Result<Arc<dyn MessengerSession>, CourierError> {
        Ok(Arc::new(MockSession {
            platform: self.platform,
            sender: sender.to_string(),
            script: self.script.clone(),
        }))
    }
}

pub struct MockSession {
    platform: Platform,
    sender: String,
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl MessengerSession for MockSession {
    async fn is_authorized(&self) -> Result<bool, CourierError> {
        Ok(!lock(&self.script).unauthorized.contains(&self.sender))
    }

    async fn lookup(&self, recipient: &str) -> Result<Option<String>, CourierError> {
        let mut script = lock(&self.script);
        script.lookups += 1;
        if let Some(message) = script.lookup_failures.pop_front() {
            return Err(CourierError::provider(message));
        }
        let canonical = canonical(recipient);
        if script.unreachable.contains(&canonical) {
            return Ok(None);
        }
        let digits = canonical.trim_start_matches('+');
        Ok(Some(match self.platform {
            Platform::Telegram => format!("tg-{digits}"),
            Platform::WhatsApp => format!("{digits}@c.us"),
            Platform::Waba => digits.to_string(),
        }))
    }

    async fn send_message(&self, contact_id: &str, text: &str) -> Result<MessageId, CourierError> {
        let mut script = lock(&self.script);
        if let Some(message) = script.send_failures.pop_front() {
            return Err(CourierError::provider(message));
        }
        script.sent.push(SentMessage {
            sender: self.sender.clone(),
            contact_id: contact_id.to_string(),
            text: text.to_string(),
        });
        Ok(MessageId(format!("{}-{}", self.platform, script.sent.len())))
    }

    async fn disconnect(&self) -> Result<(), CourierError> {
        lock(&self.script).disconnects += 1;
        Ok(())
    }
}
