//! Tests for notification store implementations

use std::path::PathBuf;

use volunteer_match::core::{MarkRead, MatchError, Notification, NotificationStore};
use volunteer_match::infra::mailbox::{
    FileNotificationStore, InMemoryNotificationStore, NotificationBackend,
};
use volunteer_match::util::ids::{EventId, NotificationId, UserId};

fn make_notification(recipient: UserId, event: EventId, created_at_ms: u64) -> Notification {
    Notification {
        id: NotificationId::new(),
        recipient_id: recipient,
        event_id: event,
        message: format!("event {event}"),
        link_to: None,
        is_read: false,
        created_at_ms,
    }
}

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("volunteer-match-{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn test_in_memory_insert_once_dedups_event_recipient_pairs() {
    let store = InMemoryNotificationStore::new();
    let recipient = UserId::new();
    let event = EventId::new();

    assert!(store.insert_once(make_notification(recipient, event, 1)).await.unwrap());
    assert!(!store.insert_once(make_notification(recipient, event, 2)).await.unwrap());
    // Same event, different recipient is a separate notification.
    assert!(store.insert_once(make_notification(UserId::new(), event, 3)).await.unwrap());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_in_memory_recent_and_unread_ordering() {
    let store = InMemoryNotificationStore::new();
    let recipient = UserId::new();
    for ts in 1..=4 {
        store
            .insert_once(make_notification(recipient, EventId::new(), ts))
            .await
            .unwrap();
    }

    let recent = store.recent(recipient, 3).await.unwrap();
    let stamps: Vec<_> = recent.iter().map(|n| n.created_at_ms).collect();
    assert_eq!(stamps, [4, 3, 2]);

    store.mark_read(recent[2].id, recipient).await.unwrap();
    let unread: Vec<_> = store
        .unread(recipient)
        .await
        .unwrap()
        .iter()
        .map(|n| n.created_at_ms)
        .collect();
    assert_eq!(unread, [1, 3, 4]);
    assert_eq!(store.unread_count(recipient).await.unwrap(), 3);
}

#[tokio::test]
async fn test_in_memory_mark_read_checks_ownership() {
    let store = InMemoryNotificationStore::new();
    let recipient = UserId::new();
    let notification = make_notification(recipient, EventId::new(), 1);
    let id = notification.id;
    store.insert_once(notification).await.unwrap();

    assert_eq!(
        store.mark_read(id, UserId::new()).await,
        Err(MatchError::NotAuthorized)
    );
    assert_eq!(store.mark_read(id, recipient).await.unwrap(), MarkRead::Marked);
    assert_eq!(store.mark_read(id, recipient).await.unwrap(), MarkRead::AlreadyRead);
    assert!(matches!(
        store.mark_read(NotificationId::new(), recipient).await,
        Err(MatchError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = temp_dir();
    let recipient = UserId::new();
    let event = EventId::new();
    let first = make_notification(recipient, event, 10);
    let second = make_notification(recipient, EventId::new(), 20);

    {
        let store = FileNotificationStore::open(&dir, "test").unwrap();
        assert!(store.path().ends_with("test_notifications.jsonl"));
        store.insert_once(first.clone()).await.unwrap();
        store.insert_once(second.clone()).await.unwrap();
        store.mark_read(first.id, recipient).await.unwrap();
    }

    let reopened = FileNotificationStore::open(&dir, "test").unwrap();
    assert_eq!(reopened.unread_count(recipient).await.unwrap(), 1);
    assert_eq!(reopened.unread(recipient).await.unwrap()[0].id, second.id);
    // The dedup index is rebuilt as well.
    assert!(!reopened
        .insert_once(make_notification(recipient, event, 30))
        .await
        .unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_file_store_streams_are_isolated() {
    let dir = temp_dir();
    let recipient = UserId::new();
    let a = FileNotificationStore::open(&dir, "a").unwrap();
    let b = FileNotificationStore::open(&dir, "b").unwrap();

    a.insert_once(make_notification(recipient, EventId::new(), 1))
        .await
        .unwrap();
    assert_eq!(a.unread_count(recipient).await.unwrap(), 1);
    assert_eq!(b.unread_count(recipient).await.unwrap(), 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_backend_enum_delegates() {
    let backend = NotificationBackend::InMemory(InMemoryNotificationStore::new());
    let recipient = UserId::new();
    backend
        .insert_once(make_notification(recipient, EventId::new(), 1))
        .await
        .unwrap();
    assert_eq!(backend.recent(recipient, 10).await.unwrap().len(), 1);
    assert_eq!(backend.unread_count(recipient).await.unwrap(), 1);
}
