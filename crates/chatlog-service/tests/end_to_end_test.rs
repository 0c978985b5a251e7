//! End-to-end: chat events in, buffered flushes to storage, queries out.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chatlog_core::{ChannelName, PartitionId, ServiceConfig, StoredMessage};
use chatlog_service::{ChatLogService, ConfigStore, ServiceError};
use chatlog_store::PartitionStore;

use support::{MockChatSource, MockResolver};

async fn setup() -> ChatLogService {
    let chat = Arc::new(MockChatSource::default());
    let resolver = Arc::new(MockResolver::new(&[("UserOne", "u1")]));
    let store = PartitionStore::connect_in_memory().await.unwrap();
    let config = Arc::new(ConfigStore::in_memory(ServiceConfig {
        flush_threshold: 10,
        ..ServiceConfig::default()
    }));

    ChatLogService::new(chat, resolver, store, config).await
}

async fn wait_for_messages(
    service: &ChatLogService,
    month: u32,
    year: i32,
    expected: usize,
) -> Vec<StoredMessage> {
    for _ in 0..200 {
        let rows = service
            .query_messages("alpha", "UserOne", month, year, None, None)
            .await
            .unwrap();
        if rows.len() == expected {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("never saw {expected} stored messages");
}

#[tokio::test]
async fn twelve_appends_flush_ten_and_buffer_two() {
    let service = setup().await;
    service.add_channel("alpha").await.unwrap();

    let current = PartitionId::current(ChannelName::normalize("alpha").unwrap());
    let (year, month) = current.timeframe();

    // Chat events arrive with the protocol's '#' prefix on the channel.
    for i in 0..12 {
        service
            .on_message("#alpha", "u1", &format!("message {i}"))
            .await;
    }

    // The 10th event crossed the threshold; its flush carries exactly the
    // first ten messages.
    let rows = wait_for_messages(&service, month, year, 10).await;
    assert_eq!(rows[0].text, "message 9");
    assert_eq!(rows[9].text, "message 0");

    // The last two are still buffered, invisible to queries until the next
    // flush - the accepted staleness window.
    assert_eq!(service.pending_len("alpha").await.unwrap(), 2);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let rows = service
        .query_messages("alpha", "UserOne", month, year, None, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 10);

    assert_eq!(service.flush_channel("alpha").await.unwrap(), 2);
    let rows = wait_for_messages(&service, month, year, 12).await;

    // Bounded query: skip the 5 newest, take 3.
    let window = service
        .query_messages("alpha", "UserOne", month, year, Some(3), Some(5))
        .await
        .unwrap();
    let texts: Vec<_> = window.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["message 6", "message 5", "message 4"]);

    // Full set is newest-first across both flush batches.
    assert_eq!(rows[0].text, "message 11");
    assert_eq!(rows[11].text, "message 0");
}

#[tokio::test]
async fn empty_timeframe_and_unknown_user_stay_distinct() {
    let service = setup().await;
    service.add_channel("alpha").await.unwrap();

    // Month with no partition: success with an empty list.
    let rows = service
        .query_messages("alpha", "UserOne", 1, 2020, None, None)
        .await
        .unwrap();
    assert!(rows.is_empty());

    // Unresolvable username: an error, not an empty list.
    let err = service
        .query_messages("alpha", "Nobody", 1, 2020, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Identity(_)));
}

#[tokio::test]
async fn messages_for_unregistered_channels_are_dropped_quietly() {
    let service = setup().await;

    // Never panics or errors back into the chat client.
    service.on_message("#ghost", "u1", "hello").await;
    service.on_message("not a channel!", "u1", "hello").await;
}

#[tokio::test]
async fn partition_sizes_report_all_configured_channels() {
    let service = setup().await;
    service.add_channel("alpha").await.unwrap();
    service.add_channel("beta").await.unwrap();

    for i in 0..10 {
        service
            .on_message("#alpha", "u1", &format!("message {i}"))
            .await;
    }
    let current = PartitionId::current(ChannelName::normalize("alpha").unwrap());
    let (year, month) = current.timeframe();
    wait_for_messages(&service, month, year, 10).await;

    let all = service.partition_sizes(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let alpha_entry = all.iter().find(|(name, _)| name.starts_with("alpha")).unwrap();
    assert!(alpha_entry.1 > 0);

    let only_beta = service.partition_sizes(Some("beta")).await.unwrap();
    assert_eq!(only_beta.len(), 1);
    assert_eq!(only_beta[0].1, 0);
}
