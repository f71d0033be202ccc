//! In-memory notification store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{MarkRead, MatchError, Notification, NotificationStore};
use crate::util::ids::{EventId, NotificationId, UserId};

/// Notification rows plus the (event, recipient) dedup index.
///
/// Shared by the in-memory and file-backed stores.
#[derive(Debug, Default)]
pub(crate) struct NotificationIndex {
    /// Per-recipient rows in creation order.
    by_recipient: HashMap<UserId, Vec<Notification>>,
    location: HashMap<NotificationId, (UserId, usize)>,
    dedup: HashSet<(EventId, UserId)>,
}

impl NotificationIndex {
    pub(crate) fn contains(&self, event_id: EventId, recipient: UserId) -> bool {
        self.dedup.contains(&(event_id, recipient))
    }

    pub(crate) fn insert(&mut self, notification: Notification) -> bool {
        if !self
            .dedup
            .insert((notification.event_id, notification.recipient_id))
        {
            return false;
        }
        let rows = self.by_recipient.entry(notification.recipient_id).or_default();
        self.location
            .insert(notification.id, (notification.recipient_id, rows.len()));
        rows.push(notification);
        true
    }

    /// Read state of a notification owned by `recipient`.
    pub(crate) fn check_read(
        &self,
        id: NotificationId,
        recipient: UserId,
    ) -> Result<bool, MatchError> {
        let (owner, pos) = self
            .location
            .get(&id)
            .copied()
            .ok_or_else(|| MatchError::not_found("notification", id))?;
        if owner != recipient {
            return Err(MatchError::NotAuthorized);
        }
        Ok(self.by_recipient[&owner][pos].is_read)
    }

    pub(crate) fn mark_read(
        &mut self,
        id: NotificationId,
        recipient: UserId,
    ) -> Result<MarkRead, MatchError> {
        if self.check_read(id, recipient)? {
            return Ok(MarkRead::AlreadyRead);
        }
        let (owner, pos) = self.location[&id];
        if let Some(row) = self
            .by_recipient
            .get_mut(&owner)
            .and_then(|rows| rows.get_mut(pos))
        {
            row.is_read = true;
        }
        Ok(MarkRead::Marked)
    }

    pub(crate) fn recent(&self, recipient: UserId, limit: usize) -> Vec<Notification> {
        self.by_recipient
            .get(&recipient)
            .map(|rows| rows.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn unread(&self, recipient: UserId) -> Vec<Notification> {
        self.by_recipient
            .get(&recipient)
            .map(|rows| rows.iter().filter(|n| !n.is_read).cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn unread_count(&self, recipient: UserId) -> u64 {
        self.by_recipient.get(&recipient).map_or(0, |rows| {
            rows.iter().filter(|n| !n.is_read).count() as u64
        })
    }
}

/// Simple in-memory notification store for development/testing.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    index: Mutex<NotificationIndex>,
}

impl InMemoryNotificationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored notifications across all recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.lock().location.len()
    }

    /// Whether no notification has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert_once(&self, notification: Notification) -> Result<bool, MatchError> {
        Ok(self.index.lock().insert(notification))
    }

    async fn recent(&self, recipient: UserId, limit: usize) -> Result<Vec<Notification>, MatchError> {
        Ok(self.index.lock().recent(recipient, limit))
    }

    async fn unread(&self, recipient: UserId) -> Result<Vec<Notification>, MatchError> {
        Ok(self.index.lock().unread(recipient))
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError> {
        Ok(self.index.lock().unread_count(recipient))
    }

    async fn mark_read(&self, id: NotificationId, recipient: UserId) -> Result<MarkRead, MatchError> {
        self.index.lock().mark_read(id, recipient)
    }
}
