//! Notification fan-out: turns committed domain events into per-recipient
//! notifications and pushes them to live subscribers.
//!
//! Each recipient has its own async lock. Persisting a notification, bumping the
//! cached unread counter, and pushing to live channels happen under that lock, and
//! so does registering a new subscription together with reading its backlog. A
//! subscriber therefore sees every notification exactly once and in creation order,
//! no matter how a subscribe races with a delivery.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::MatchError;
use super::event::{DomainEvent, EventKind};
use super::model::{ApplicationStatus, Notification};
use super::store::{Directory, MarkRead, NotificationStore};
use crate::util::clock::now_ms;
use crate::util::ids::{NotificationId, UserId};

#[derive(Default)]
struct RecipientState {
    subscribers: Vec<mpsc::UnboundedSender<Notification>>,
    /// Cached unread count; loaded from the store on first use.
    unread: Option<u64>,
}

/// Outcome of handling one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Recipients resolved for the event.
    pub recipients: usize,
    /// Notifications newly created.
    pub created: usize,
    /// Notifications skipped because they already existed (redelivery).
    pub duplicates: usize,
    /// Live channels the new notifications were pushed to.
    pub pushed: usize,
}

/// Live view of a recipient's notifications: unread backlog first, then new ones
/// as they are created.
pub struct Subscription {
    recipient: UserId,
    backlog: VecDeque<Notification>,
    live: mpsc::UnboundedReceiver<Notification>,
}

impl Subscription {
    /// Recipient this subscription belongs to.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Wait for the next notification. Returns `None` once the engine that owns the
    /// fan-out is dropped.
    pub async fn recv(&mut self) -> Option<Notification> {
        if let Some(next) = self.backlog.pop_front() {
            return Some(next);
        }
        self.live.recv().await
    }

    /// Next notification if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.backlog
            .pop_front()
            .or_else(|| self.live.try_recv().ok())
    }

    /// Consume into a `Stream` of notifications.
    pub fn into_stream(self) -> impl Stream<Item = Notification> + Send {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|n| (n, sub))
        })
    }
}

/// Routes domain events to recipients and keeps unread counters.
pub struct NotificationFanout<N, D> {
    notifications: Arc<N>,
    directory: Arc<D>,
    recipients: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<RecipientState>>>>,
}

impl<N, D> NotificationFanout<N, D>
where
    N: NotificationStore,
    D: Directory,
{
    /// Create a fan-out writing to `notifications` and resolving staff via `directory`.
    pub fn new(notifications: Arc<N>, directory: Arc<D>) -> Self {
        Self {
            notifications,
            directory,
            recipients: Mutex::new(HashMap::new()),
        }
    }

    /// Notification store behind this fan-out.
    pub fn store(&self) -> &Arc<N> {
        &self.notifications
    }

    fn slot(&self, recipient: UserId) -> Arc<tokio::sync::Mutex<RecipientState>> {
        Arc::clone(self.recipients.lock().entry(recipient).or_default())
    }

    /// Give back a slot taken with [`Self::slot`], forgetting the recipient once it
    /// has no live channel.
    ///
    /// The map entry is removed only while the map lock is held and nobody else
    /// holds the slot, so two operations on one recipient always share a lock.
    /// The unread counter goes with it and is reloaded from the store on next use.
    fn release(&self, recipient: UserId, slot: Arc<tokio::sync::Mutex<RecipientState>>) {
        let mut recipients = self.recipients.lock();
        drop(slot);
        let idle = recipients.get(&recipient).is_some_and(|entry| {
            Arc::strong_count(entry) == 1
                && entry.try_lock().is_ok_and(|mut state| {
                    state.subscribers.retain(|tx| !tx.is_closed());
                    state.subscribers.is_empty()
                })
        });
        if idle {
            recipients.remove(&recipient);
        }
    }

    /// Recipients currently holding in-memory state: live channels or an
    /// operation in flight.
    #[must_use]
    pub fn tracked_recipients(&self) -> usize {
        self.recipients.lock().len()
    }

    /// Materialize and push the notifications for one committed event.
    ///
    /// Safe to call again with the same event: existing (event, recipient) pairs
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the caller should redeliver the event later.
    pub async fn handle_event(&self, event: &DomainEvent) -> Result<FanoutReport, MatchError> {
        let recipients = self.resolve_recipients(event).await?;
        let mut report = FanoutReport {
            recipients: recipients.len(),
            ..FanoutReport::default()
        };
        let (message, link_to) = render(event);

        for recipient in recipients {
            let notification = Notification {
                id: NotificationId::new(),
                recipient_id: recipient,
                event_id: event.id,
                message: message.clone(),
                link_to: link_to.clone(),
                is_read: false,
                created_at_ms: now_ms(),
            };
            match self.deliver(notification).await? {
                Some(pushed) => {
                    report.created += 1;
                    report.pushed += pushed;
                }
                None => report.duplicates += 1,
            }
        }

        tracing::debug!(
            event_id = %event.id,
            sequence = event.sequence,
            created = report.created,
            duplicates = report.duplicates,
            pushed = report.pushed,
            "event fanned out"
        );
        Ok(report)
    }

    /// Persist one notification and push it to the recipient's live channels.
    ///
    /// Returns `None` if it already existed, otherwise the number of channels
    /// it reached.
    async fn deliver(&self, notification: Notification) -> Result<Option<usize>, MatchError> {
        let recipient = notification.recipient_id;
        let slot = self.slot(recipient);
        let outcome = Self::deliver_locked(&self.notifications, &slot, notification).await;
        self.release(recipient, slot);
        outcome
    }

    async fn deliver_locked(
        notifications: &N,
        slot: &tokio::sync::Mutex<RecipientState>,
        notification: Notification,
    ) -> Result<Option<usize>, MatchError> {
        let recipient = notification.recipient_id;
        let mut state = slot.lock().await;

        if !notifications.insert_once(notification.clone()).await? {
            return Ok(None);
        }
        if let Some(unread) = state.unread.as_mut() {
            *unread += 1;
        }

        let before = state.subscribers.len();
        state
            .subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
        let pushed = state.subscribers.len();
        if pushed < before {
            tracing::debug!(
                recipient = %recipient,
                dropped = before - pushed,
                "pruned disconnected subscribers"
            );
        }
        Ok(Some(pushed))
    }

    async fn resolve_recipients(&self, event: &DomainEvent) -> Result<Vec<UserId>, MatchError> {
        match event.kind {
            EventKind::ApplicationDecided => Ok(vec![event.volunteer_id]),
            EventKind::ApplicationSubmitted | EventKind::ApplicationWithdrawn => {
                let organization = self
                    .directory
                    .organization(event.organization_id)
                    .await?;
                let Some(organization) = organization else {
                    tracing::warn!(
                        organization_id = %event.organization_id,
                        event_id = %event.id,
                        "event for unknown organization has no recipients"
                    );
                    return Ok(Vec::new());
                };
                let mut staff = organization.staff;
                staff.sort_unstable();
                staff.dedup();
                Ok(staff)
            }
        }
    }

    /// Open a live subscription. Unread notifications are delivered first.
    ///
    /// # Errors
    ///
    /// Propagates store failures while loading the backlog.
    pub async fn subscribe(&self, recipient: UserId) -> Result<Subscription, MatchError> {
        let slot = self.slot(recipient);
        let backlog = {
            let mut state = slot.lock().await;
            self.notifications.unread(recipient).await.map(|backlog| {
                let (tx, rx) = mpsc::unbounded_channel();
                state.subscribers.push(tx);
                (backlog, rx)
            })
        };
        self.release(recipient, slot);
        let (backlog, live) = backlog?;
        tracing::debug!(
            recipient = %recipient,
            backlog = backlog.len(),
            "subscriber connected"
        );
        Ok(Subscription {
            recipient,
            backlog: backlog.into(),
            live,
        })
    }

    /// Number of open live channels for a recipient.
    pub async fn live_subscribers(&self, recipient: UserId) -> usize {
        let slot = self.slot(recipient);
        let live = {
            let mut state = slot.lock().await;
            state.subscribers.retain(|tx| !tx.is_closed());
            state.subscribers.len()
        };
        self.release(recipient, slot);
        live
    }

    /// Unread notifications for a recipient.
    ///
    /// # Errors
    ///
    /// Propagates store failures on the first load.
    pub async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError> {
        let slot = self.slot(recipient);
        let unread = {
            let mut state = slot.lock().await;
            match state.unread {
                Some(unread) => Ok(unread),
                None => {
                    let loaded = self.notifications.unread_count(recipient).await;
                    if let Ok(unread) = loaded {
                        state.unread = Some(unread);
                    }
                    loaded
                }
            }
        };
        self.release(recipient, slot);
        unread
    }

    /// Mark a notification read. Marking an already-read one is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `NotAuthorized` if it belongs to someone else.
    pub async fn mark_read(
        &self,
        notification_id: NotificationId,
        recipient: UserId,
    ) -> Result<MarkRead, MatchError> {
        let slot = self.slot(recipient);
        let outcome = {
            let mut state = slot.lock().await;
            let outcome = self.notifications.mark_read(notification_id, recipient).await;
            if outcome == Ok(MarkRead::Marked) {
                if let Some(unread) = state.unread.as_mut() {
                    *unread = unread.saturating_sub(1);
                }
            }
            outcome
        };
        self.release(recipient, slot);
        outcome
    }

    /// Most recent notifications for a recipient, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn recent(&self, recipient: UserId, limit: usize) -> Result<Vec<Notification>, MatchError> {
        self.notifications.recent(recipient, limit).await
    }
}

fn render(event: &DomainEvent) -> (String, Option<String>) {
    let title = &event.opportunity_title;
    match event.kind {
        EventKind::ApplicationSubmitted => (
            format!("New application received for \"{title}\""),
            Some(format!("/dashboard/opportunities/{}", event.opportunity_id)),
        ),
        EventKind::ApplicationDecided => {
            let verdict = match event.status {
                ApplicationStatus::Approved => "approved",
                ApplicationStatus::Rejected => "rejected",
                other => {
                    tracing::warn!(status = %other, event_id = %event.id, "unexpected decided status");
                    "updated"
                }
            };
            (
                format!("Your application for \"{title}\" was {verdict}"),
                Some(format!("/opportunities/{}", event.opportunity_id)),
            )
        }
        EventKind::ApplicationWithdrawn => (
            format!("A volunteer withdrew from \"{title}\""),
            Some(format!("/dashboard/opportunities/{}", event.opportunity_id)),
        ),
    }
}
