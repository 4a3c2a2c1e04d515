// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end distribution over SQLite storage and mock messenger sessions.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;

use courier_config::CourierConfig;
use courier_core::{
    BanStatus, BanUpdate, CheckMode, ContactStatus, CourierError, DeliveryOutcome, Lead,
    LeadStatus, PhoneNumberRepository, Platform, PlatformAccount, PlatformChecker, SendError,
    SenderPhoneNumber,
};
use courier_distribution::{LeadReplyOutcome, MessageDistributionService, PhoneNumberManager};
use courier_platform::{CheckerRegistry, MessagingPlatformChecker, RetryPolicy};
use courier_sender::{MessageSender, NoDelay};
use courier_test_utils::{
    InMemoryStore, ManualClock, MockChecker, MockSessionProvider, NOTIFY_ID, OPERATOR,
    RecordingNotifier, TestHarness,
};

const FIRST: &str = "+15550000001";
const SECOND: &str = "+15550000002";
const RECIPIENT: &str = "+15551234567";

async fn harness() -> TestHarness {
    TestHarness::builder().build().await.unwrap()
}

#[tokio::test]
async fn single_telegram_sender_delivers_and_counts_the_contact() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 1, 0).await.unwrap();

    let report = h
        .service
        .distribute_message("c1", Some("hi"), RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();

    let outcome = report.outcome(Platform::Telegram).unwrap();
    assert!(outcome.is_success());
    let account = h.account(FIRST, Platform::Telegram).await.unwrap().unwrap();
    assert_eq!(account.contacts_reached_today, 1);
    assert_eq!(account.messages_sent_today, 1);

    let sent = h.provider(Platform::Telegram).sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender, FIRST);
    assert_eq!(sent[0].contact_id, "tg-15551234567");
    assert_eq!(sent[0].text, "hi");

    let dialogs = h.storage.list_dialogs(OPERATOR).await.unwrap();
    assert_eq!(dialogs.len(), 1);
}

#[tokio::test]
async fn exhausted_sender_is_replaced_and_operators_are_told() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 1, 0).await.unwrap();
    h.add_sender("c1", SECOND, Platform::Telegram, 5, 0).await.unwrap();

    let report = h
        .service
        .distribute_message("c1", None, "+15551111111", None, CheckMode::One)
        .await
        .unwrap();
    assert!(report.any_success());
    let first_account = h.account(FIRST, Platform::Telegram).await.unwrap().unwrap();
    assert_eq!(first_account.contacts_reached_today, 1);

    let report = h
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();
    match report.outcome(Platform::Telegram) {
        Some(DeliveryOutcome::Delivered { sender, .. }) => assert_eq!(sender, SECOND),
        other => panic!("expected delivery from the second number, got {other:?}"),
    }

    let notifications = h.notifier.notifications().await;
    assert_eq!(notifications.len(), 1);
    let (telegram_id, text) = &notifications[0];
    assert_eq!(*telegram_id, NOTIFY_ID);
    assert!(text.contains(FIRST) && text.contains(SECOND), "{text}");
}

#[tokio::test]
async fn bulk_run_records_unreachable_contact_and_marks_lead() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 10, 0).await.unwrap();
    h.provider(Platform::Telegram).set_unreachable("+15552222222");

    let contacts = vec![
        "+15551111111".to_string(),
        "+15552222222".to_string(),
        "+15553333333".to_string(),
    ];
    let summary = h
        .service
        .bulk_distribute("c1", &contacts, None, None, CheckMode::One)
        .await
        .unwrap();

    assert_eq!(summary.total_contacts, 3);
    assert_eq!(summary.successful_sends, 2);
    assert_eq!(summary.failed_sends, 1);
    assert_eq!(summary.details[1].status, ContactStatus::Failed);
    assert!(summary.details[1].error.is_some());
    assert_eq!(summary.details[0].platforms, vec![Platform::Telegram]);
    assert_eq!(
        h.lead_status("+15552222222").await.unwrap(),
        Some(LeadStatus::Unavailable)
    );
    assert_eq!(h.provider(Platform::Telegram).sent().len(), 2);
}

#[tokio::test]
async fn composite_priority_covers_telegram_and_waba_only() {
    let h = harness().await;
    h.create_campaign("c1", "tgwaba", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 5, 0).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Waba, 5, 0).await.unwrap();

    let report = h
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::Both)
        .await
        .unwrap();

    assert!(report.contains(Platform::Telegram));
    assert!(report.contains(Platform::Waba));
    assert!(!report.contains(Platform::WhatsApp));
    assert_eq!(
        report.successful_platforms(),
        vec![Platform::Telegram, Platform::Waba]
    );
    assert_eq!(h.provider(Platform::Waba).sent()[0].contact_id, "15551234567");
}

#[tokio::test]
async fn batch_continues_past_invalid_and_failing_contacts() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 10, 0).await.unwrap();
    h.provider(Platform::Telegram)
        .fail_next_sends(["connection reset by peer"]);

    let contacts = vec![
        "not a number".to_string(),
        "+15551111111".to_string(),
        "+15553333333".to_string(),
    ];
    let summary = h
        .service
        .bulk_distribute("c1", &contacts, None, None, CheckMode::One)
        .await
        .unwrap();

    assert_eq!(summary.successful_sends, 1);
    assert_eq!(summary.failed_sends, 2);
    assert_eq!(summary.details.len(), 3);
    assert_eq!(summary.details[2].status, ContactStatus::Success);
    let reason = summary.details[1].error.as_deref().unwrap();
    assert!(reason.contains("connection reset"), "{reason}");

    // The failed send released its reservation.
    let account = h.account(FIRST, Platform::Telegram).await.unwrap().unwrap();
    assert_eq!(account.contacts_reached_today, 1);
}

#[tokio::test]
async fn ban_naming_the_sender_is_written_back_and_sender_retired() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 10, 0).await.unwrap();
    h.add_sender("c1", SECOND, Platform::Telegram, 10, 0).await.unwrap();
    h.provider(Platform::Telegram)
        .fail_next_sends([format!("USER_DEACTIVATED: {FIRST}")]);

    let report = h
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();
    assert!(!report.any_success());

    let banned = h.storage.get_phone_number_info(FIRST).await.unwrap().unwrap();
    assert!(banned.is_banned);
    assert_eq!(banned.ban_status, Some(BanStatus::UserDeactivated));

    let report = h
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();
    match report.outcome(Platform::Telegram) {
        Some(DeliveryOutcome::Delivered { sender, .. }) => assert_eq!(sender, SECOND),
        other => panic!("expected delivery from the second number, got {other:?}"),
    }
}

#[tokio::test]
async fn recipient_privacy_restriction_does_not_retire_the_sender() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("campaign text")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 100, 0).await.unwrap();
    h.provider(Platform::Telegram).fail_next_sends(["PRIVACY_RESTRICTED"]);

    let contacts = vec![
        "+15551111111".to_string(),
        "+15552222222".to_string(),
        "+15553333333".to_string(),
    ];
    let summary = h
        .service
        .bulk_distribute("c1", &contacts, None, None, CheckMode::One)
        .await
        .unwrap();

    assert_eq!(summary.successful_sends, 2);
    assert_eq!(summary.failed_sends, 1);
    assert_eq!(summary.details[0].status, ContactStatus::Failed);

    let sender = h.storage.get_phone_number_info(FIRST).await.unwrap().unwrap();
    assert!(!sender.is_banned);
    assert_eq!(sender.ban_status, None);
    assert_eq!(
        h.lead_status("+15551111111").await.unwrap(),
        Some(LeadStatus::Unavailable)
    );

    let sent = h.provider(Platform::Telegram).sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.sender == FIRST));
}

#[tokio::test]
async fn missing_campaign_and_senders_are_rejected() {
    let h = harness().await;
    let err = h
        .service
        .distribute_message("nope", Some("hi"), RECIPIENT, None, CheckMode::One)
        .await
        .unwrap_err();
    assert!(matches!(err, CourierError::CampaignNotFound(_)));

    h.create_campaign("c1", "telegram", None).await.unwrap();
    let err = h
        .service
        .distribute_message("c1", Some("hi"), RECIPIENT, None, CheckMode::One)
        .await
        .unwrap_err();
    assert!(matches!(err, CourierError::NoSenderNumbers(_)));

    h.add_sender("c1", FIRST, Platform::Telegram, 5, 0).await.unwrap();
    let err = h
        .service
        .distribute_message("c1", Some("   "), RECIPIENT, None, CheckMode::One)
        .await
        .unwrap_err();
    assert!(matches!(err, CourierError::EmptyMessage(_)));
}

#[tokio::test]
async fn lead_replies_are_rate_limited_per_lead_and_operator() {
    let h = TestHarness::builder()
        .with_config(|c| c.lead_reply.rate_limit_secs = 60)
        .build()
        .await
        .unwrap();
    h.create_campaign("c1", "telegram", Some("thanks for reaching out")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 10, 0).await.unwrap();
    let lead = Lead {
        phone_number: RECIPIENT.to_string(),
        name: Some("Dana".to_string()),
    };

    let first = h.service.send_message_to_lead(&lead, OPERATOR).await.unwrap();
    assert!(matches!(first, LeadReplyOutcome::Delivered(ref r) if r.any_success()));
    let second = h.service.send_message_to_lead(&lead, OPERATOR).await.unwrap();
    assert_eq!(second, LeadReplyOutcome::RateLimited);

    h.clock.advance(TimeDelta::seconds(61));
    let third = h.service.send_message_to_lead(&lead, OPERATOR).await.unwrap();
    assert!(matches!(third, LeadReplyOutcome::Delivered(_)));
    assert_eq!(
        h.provider(Platform::Telegram).sent()[0].text,
        "thanks for reaching out"
    );

    let other = h.service.send_message_to_lead(&lead, "someone-else").await.unwrap();
    assert_eq!(other, LeadReplyOutcome::NoActiveCampaign);
}

#[tokio::test]
async fn lead_reply_slot_ignores_number_formatting() {
    let h = harness().await;
    h.create_campaign("c1", "telegram", Some("thanks for reaching out")).await.unwrap();
    h.add_sender("c1", FIRST, Platform::Telegram, 10, 0).await.unwrap();
    let compact = Lead {
        phone_number: RECIPIENT.to_string(),
        name: None,
    };
    let spaced = Lead {
        phone_number: "+1 555 123 4567".to_string(),
        name: None,
    };

    let first = h.service.send_message_to_lead(&spaced, OPERATOR).await.unwrap();
    assert!(matches!(first, LeadReplyOutcome::Delivered(_)));
    let second = h.service.send_message_to_lead(&compact, OPERATOR).await.unwrap();
    assert_eq!(second, LeadReplyOutcome::RateLimited);
    assert_eq!(h.provider(Platform::Telegram).sent().len(), 1);
}

/// Reports every sender as available while refusing reservations for some.
struct StaleQuota {
    inner: Arc<InMemoryStore>,
    exhausted: HashSet<String>,
}

#[async_trait]
impl PhoneNumberRepository for StaleQuota {
    async fn get_phone_number_info(
        &self,
        phone_number: &str,
    ) -> Result<Option<SenderPhoneNumber>, CourierError> {
        self.inner.get_phone_number_info(phone_number).await
    }

    async fn reserve_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<bool, CourierError> {
        if self.exhausted.contains(phone_number) {
            return Ok(false);
        }
        self.inner.reserve_send(phone_number, platform, is_new_contact).await
    }

    async fn release_send(
        &self,
        phone_number: &str,
        platform: Platform,
        is_new_contact: bool,
    ) -> Result<(), CourierError> {
        self.inner.release_send(phone_number, platform, is_new_contact).await
    }

    async fn update_phone_number_ban_status(
        &self,
        phone_number: &str,
        ban: &BanUpdate,
    ) -> Result<(), CourierError> {
        self.inner.update_phone_number_ban_status(phone_number, ban).await
    }
}

struct StaleFixture {
    service: MessageDistributionService,
    notifier: Arc<RecordingNotifier>,
    provider: Arc<MockSessionProvider>,
}

async fn stale_quota_service(exhausted: &[&str]) -> StaleFixture {
    let store = Arc::new(InMemoryStore::new());
    store
        .add_campaign(courier_core::Campaign {
            id: "c1".into(),
            user_id: "op".into(),
            message: Some("hello".into()),
            platform_priority: "telegram".into(),
            is_active: true,
            notification_telegram_ids: vec![7],
        })
        .await;
    for phone in [FIRST, SECOND] {
        store
            .add_phone_number(
                SenderPhoneNumber::new(phone)
                    .with_account(Platform::Telegram, PlatformAccount::authenticated(5)),
            )
            .await;
        store
            .attach("c1", courier_core::CampaignPhoneNumber {
                phone_number: phone.into(),
                platform: Platform::Telegram,
            })
            .await;
    }
    let phones = Arc::new(StaleQuota {
        inner: store.clone(),
        exhausted: exhausted.iter().map(|p| p.to_string()).collect(),
    });
    let clock = Arc::new(ManualClock::default());
    let config = CourierConfig::default();

    let mock = Arc::new(MockChecker::reachable(Platform::Telegram));
    let registry = Arc::new(CheckerRegistry::new(move |platform: Platform| match platform {
        Platform::Telegram => Ok(mock.clone() as Arc<dyn PlatformChecker>),
        other => Err(CourierError::UnsupportedPlatform(other.to_string())),
    }));
    let checker = Arc::new(
        MessagingPlatformChecker::new(
            registry,
            store.clone(),
            phones.clone(),
            store.clone(),
            clock.clone(),
            &config,
        )
        .with_policy(RetryPolicy::immediate(3)),
    );
    let rotation = Arc::new(PhoneNumberManager::new(store.clone(), phones.clone(), clock.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    rotation.set_notifier(notifier.clone());
    let provider = Arc::new(MockSessionProvider::new(Platform::Telegram));
    let sender = MessageSender::new(
        store.clone(),
        phones,
        store.clone(),
        store.clone(),
        Arc::new(NoDelay),
        clock.clone(),
    )
    .with_session_provider(provider.clone());

    StaleFixture {
        service: MessageDistributionService::new(
            store,
            checker,
            rotation,
            Arc::new(sender),
            clock,
            &config,
        ),
        notifier,
        provider,
    }
}

#[tokio::test]
async fn daily_limit_rotates_to_the_next_sender() {
    let f = stale_quota_service(&[FIRST]).await;
    let report = f
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();

    match report.outcome(Platform::Telegram) {
        Some(DeliveryOutcome::Delivered { sender, .. }) => assert_eq!(sender, SECOND),
        other => panic!("expected delivery after rotation, got {other:?}"),
    }
    assert_eq!(f.provider.sent().len(), 1);
    let notifications = f.notifier.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].1.contains("switched from +15550000001 to +15550000002"));
}

#[tokio::test]
async fn daily_limit_everywhere_ends_with_the_limit_failure() {
    let f = stale_quota_service(&[FIRST, SECOND]).await;
    let report = f
        .service
        .distribute_message("c1", None, RECIPIENT, None, CheckMode::One)
        .await
        .unwrap();

    match report.outcome(Platform::Telegram) {
        Some(DeliveryOutcome::Failed { error, .. }) => {
            assert_eq!(*error, SendError::DailyLimitReached);
        }
        other => panic!("expected the limit failure, got {other:?}"),
    }
    assert!(f.provider.sent().is_empty());
}
