//! Event emitter: relays committed outbox events to the notification fan-out.
//!
//! Events are written to the store outbox inside the same transaction as the state
//! change, so nothing is published for a rolled-back operation. The relay reads the
//! outbox in sequence order and advances its cursor only after the fan-out has
//! accepted an event. A failure leaves the cursor in place and the event is
//! delivered again on the next pump (at-least-once); the fan-out's dedup index
//! makes the redelivery harmless.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use super::error::MatchError;
use super::fanout::NotificationFanout;
use super::store::{ApplicationStore, Directory, NotificationStore};

/// Abstraction for spawning background work on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Relays outbox events to the fan-out in commit order.
pub struct EventRelay<S, N> {
    store: Arc<S>,
    fanout: Arc<NotificationFanout<N, S>>,
    /// Sequence of the last event the fan-out accepted.
    cursor: tokio::sync::Mutex<u64>,
    batch_size: usize,
    wake: Notify,
    shutdown: AtomicBool,
}

impl<S, N> EventRelay<S, N> {
    /// Wake the background loop after a commit.
    pub fn notify(&self) {
        self.wake.notify_one();
    }

    /// Stop the background loop after its current pump.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

impl<S, N> EventRelay<S, N>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    /// Create a relay starting at the beginning of the outbox.
    pub fn new(store: Arc<S>, fanout: Arc<NotificationFanout<N, S>>, batch_size: usize) -> Self {
        Self {
            store,
            fanout,
            cursor: tokio::sync::Mutex::new(0),
            batch_size: batch_size.max(1),
            wake: Notify::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Sequence of the last relayed event.
    pub async fn cursor(&self) -> u64 {
        *self.cursor.lock().await
    }

    /// Relay every committed event past the cursor. Returns how many were relayed.
    ///
    /// Concurrent pumps are serialized so events reach the fan-out in order.
    ///
    /// # Errors
    ///
    /// Returns the first store or fan-out failure; events up to the failing one
    /// stay relayed.
    pub async fn pump(&self) -> Result<usize, MatchError> {
        let mut cursor = self.cursor.lock().await;
        let mut relayed = 0;
        loop {
            let batch = self.store.events_after(*cursor, self.batch_size).await?;
            if batch.is_empty() {
                break;
            }
            for event in batch {
                if let Err(err) = self.fanout.handle_event(&event).await {
                    tracing::warn!(
                        event_id = %event.id,
                        sequence = event.sequence,
                        error = %err,
                        "fan-out failed, event will be redelivered"
                    );
                    return Err(err);
                }
                *cursor = event.sequence;
                relayed += 1;
            }
        }
        if relayed > 0 {
            tracing::debug!(relayed, cursor = *cursor, "outbox relayed");
        }
        Ok(relayed)
    }

    /// Move the cursor back so events after `sequence` are delivered again.
    pub async fn rewind(&self, sequence: u64) {
        let mut cursor = self.cursor.lock().await;
        if sequence < *cursor {
            tracing::info!(from = *cursor, to = sequence, "relay cursor rewound");
            *cursor = sequence;
        }
    }

    /// Run the relay in the background, pumping on every wake-up and at least
    /// once per `idle` interval.
    pub fn spawn_background<Sp: Spawn>(self: &Arc<Self>, spawner: &Sp, idle: Duration) {
        let relay = Arc::clone(self);
        spawner.spawn(async move {
            tracing::debug!("event relay started");
            while !relay.shutdown.load(Ordering::SeqCst) {
                if let Err(err) = relay.pump().await {
                    tracing::warn!(error = %err, "event relay pump failed");
                }
                tokio::select! {
                    () = relay.wake.notified() => {}
                    () = tokio::time::sleep(idle) => {}
                }
            }
            tracing::debug!("event relay stopped");
        });
    }
}
