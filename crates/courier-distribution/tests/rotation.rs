// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender availability and rotation properties.

use std::sync::Arc;

use proptest::prelude::*;

use courier_core::{Campaign, CampaignPhoneNumber, Platform, PlatformAccount, SenderPhoneNumber};
use courier_distribution::PhoneNumberManager;
use courier_test_utils::{InMemoryStore, ManualClock};

const CAMPAIGN: &str = "c1";

fn number(phone: &str, banned: bool, authenticated: bool, limit: u32, reached: u32) -> SenderPhoneNumber {
    let mut account = PlatformAccount::authenticated(limit);
    account.is_authenticated = authenticated;
    account.contacts_reached_today = reached;
    let mut number = SenderPhoneNumber::new(phone).with_account(Platform::Telegram, account);
    number.is_banned = banned;
    number
}

async fn campaign_with(numbers: Vec<SenderPhoneNumber>) -> (Arc<InMemoryStore>, PhoneNumberManager) {
    let store = Arc::new(InMemoryStore::new());
    store
        .add_campaign(Campaign {
            id: CAMPAIGN.into(),
            user_id: "op".into(),
            message: Some("hello".into()),
            platform_priority: "telegram".into(),
            is_active: true,
            notification_telegram_ids: Vec::new(),
        })
        .await;
    for number in numbers {
        store
            .attach(CAMPAIGN, CampaignPhoneNumber {
                phone_number: number.phone_number.clone(),
                platform: Platform::Telegram,
            })
            .await;
        store.add_phone_number(number).await;
    }
    let manager = PhoneNumberManager::new(store.clone(), store.clone(), Arc::new(ManualClock::default()));
    (store, manager)
}

proptest! {
    #[test]
    fn availability_matches_ban_auth_and_quota(
        banned in any::<bool>(),
        authenticated in any::<bool>(),
        limit in 0u32..20,
        reached in 0u32..25,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let available = runtime.block_on(async {
            let (_store, manager) =
                campaign_with(vec![number("+15550000001", banned, authenticated, limit, reached)]).await;
            manager
                .is_phone_number_available("+15550000001", Platform::Telegram)
                .await
                .unwrap()
        });
        let expected = !banned && authenticated && reached < limit;
        prop_assert_eq!(available, expected);
    }

    #[test]
    fn switching_never_repeats_with_several_available(count in 2usize..6, rounds in 1usize..12) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let numbers = (0..count)
                .map(|i| number(&format!("+1555000000{i}"), false, true, 5, 0))
                .collect();
            let (_store, manager) = campaign_with(numbers).await;

            let mut current = manager
                .get_next_available_phone_number(CAMPAIGN, Platform::Telegram)
                .await
                .unwrap()
                .unwrap();
            for _ in 0..rounds {
                let next = manager
                    .switch_to_next_phone_number(CAMPAIGN, &current, Platform::Telegram)
                    .await
                    .unwrap()
                    .unwrap();
                assert_ne!(next, current);
                current = next;
            }
        });
    }
}

#[tokio::test]
async fn single_available_number_is_returned_again() {
    let (_store, manager) = campaign_with(vec![
        number("+15550000001", false, true, 5, 0),
        number("+15550000002", true, true, 5, 0),
    ])
    .await;
    let next = manager
        .switch_to_next_phone_number(CAMPAIGN, "+15550000001", Platform::Telegram)
        .await
        .unwrap();
    assert_eq!(next.as_deref(), Some("+15550000001"));
}

#[tokio::test]
async fn switch_returns_none_exactly_when_all_are_unavailable() {
    let (store, manager) = campaign_with(vec![
        number("+15550000001", false, true, 1, 0),
        number("+15550000002", false, false, 5, 0),
        number("+15550000003", true, true, 5, 0),
    ])
    .await;
    let next = manager
        .switch_to_next_phone_number(CAMPAIGN, "+15550000003", Platform::Telegram)
        .await
        .unwrap();
    assert_eq!(next.as_deref(), Some("+15550000001"));

    // Use up the last number's quota.
    store
        .add_phone_number(number("+15550000001", false, true, 1, 1))
        .await;
    let next = manager
        .switch_to_next_phone_number(CAMPAIGN, "+15550000001", Platform::Telegram)
        .await
        .unwrap();
    assert_eq!(next, None);
    assert_eq!(manager.active_sender(CAMPAIGN, Platform::Telegram), None);
}
