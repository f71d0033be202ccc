//! Notification store backends.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::core::{MarkRead, MatchError, Notification, NotificationStore};
use crate::util::ids::{NotificationId, UserId};

pub use file::FileNotificationStore;
pub use memory::InMemoryNotificationStore;

/// Notification backend selected at runtime from configuration.
pub enum NotificationBackend {
    /// In-memory store.
    InMemory(InMemoryNotificationStore),
    /// JSON-lines file store.
    File(FileNotificationStore),
}

#[async_trait]
impl NotificationStore for NotificationBackend {
    async fn insert_once(&self, notification: Notification) -> Result<bool, MatchError> {
        match self {
            Self::InMemory(store) => store.insert_once(notification).await,
            Self::File(store) => store.insert_once(notification).await,
        }
    }

    async fn recent(&self, recipient: UserId, limit: usize) -> Result<Vec<Notification>, MatchError> {
        match self {
            Self::InMemory(store) => store.recent(recipient, limit).await,
            Self::File(store) => store.recent(recipient, limit).await,
        }
    }

    async fn unread(&self, recipient: UserId) -> Result<Vec<Notification>, MatchError> {
        match self {
            Self::InMemory(store) => store.unread(recipient).await,
            Self::File(store) => store.unread(recipient).await,
        }
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError> {
        match self {
            Self::InMemory(store) => store.unread_count(recipient).await,
            Self::File(store) => store.unread_count(recipient).await,
        }
    }

    async fn mark_read(&self, id: NotificationId, recipient: UserId) -> Result<MarkRead, MatchError> {
        match self {
            Self::InMemory(store) => store.mark_read(id, recipient).await,
            Self::File(store) => store.mark_read(id, recipient).await,
        }
    }
}
