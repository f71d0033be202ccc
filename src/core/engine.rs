//! Engine facade: the operations exposed to UI and dashboard collaborators.
//!
//! Mutations go through the [`TransitionAuthority`]; after each commit the
//! [`EventRelay`] is pumped inline or woken, depending on [`RelayMode`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::authority::{RepeatPolicy, Transition, TransitionAuthority};
use super::emitter::EventRelay;
use super::error::MatchError;
use super::fanout::{NotificationFanout, Subscription};
use super::model::{Actor, Application, Decision, NewOpportunity, Notification, Opportunity};
use super::projector::{DashboardProjector, DashboardView, HistoryEntry, OpportunityFilter, Roster};
use super::store::{ApplicationStore, Directory, MarkRead, NotificationStore};
use crate::util::ids::{ApplicationId, NotificationId, OpportunityId, UserId};

/// When committed events reach the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// The mutating call pumps the relay before returning.
    #[default]
    Inline,
    /// A background task pumps the relay; mutating calls only wake it.
    Background,
}

/// Tunables for [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Answer to repeated terminal transitions.
    pub repeat: RepeatPolicy,
    /// How events are relayed.
    pub relay_mode: RelayMode,
    /// Events read from the outbox per batch.
    pub relay_batch_size: usize,
    /// Default page size for recent notifications.
    pub recent_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            repeat: RepeatPolicy::NoOp,
            relay_mode: RelayMode::Inline,
            relay_batch_size: 64,
            recent_limit: 10,
        }
    }
}

/// Matching engine wired over an application store and a notification store.
///
/// Dropping the engine stops a background relay started from it.
pub struct Engine<S, N> {
    authority: TransitionAuthority<S>,
    fanout: Arc<NotificationFanout<N, S>>,
    relay: Arc<EventRelay<S, N>>,
    projector: DashboardProjector<S>,
    options: EngineOptions,
}

impl<S, N> Engine<S, N>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    /// Wire the engine components.
    pub fn new(store: Arc<S>, notifications: Arc<N>, options: EngineOptions) -> Self {
        let fanout = Arc::new(NotificationFanout::new(notifications, Arc::clone(&store)));
        let relay = Arc::new(EventRelay::new(
            Arc::clone(&store),
            Arc::clone(&fanout),
            options.relay_batch_size,
        ));
        Self {
            authority: TransitionAuthority::new(Arc::clone(&store), options.repeat),
            fanout,
            relay,
            projector: DashboardProjector::new(store),
            options,
        }
    }

    /// The transition authority.
    pub const fn authority(&self) -> &TransitionAuthority<S> {
        &self.authority
    }

    /// The notification fan-out.
    pub const fn fanout(&self) -> &Arc<NotificationFanout<N, S>> {
        &self.fanout
    }

    /// The event relay.
    pub const fn relay(&self) -> &Arc<EventRelay<S, N>> {
        &self.relay
    }

    /// The dashboard projector.
    pub const fn projector(&self) -> &DashboardProjector<S> {
        &self.projector
    }

    /// Options the engine was built with.
    pub const fn options(&self) -> EngineOptions {
        self.options
    }

    /// Hand committed events to the fan-out.
    ///
    /// Runs after every lifecycle call, including repeats and failures: a retry
    /// after an unknown outcome usually changes nothing, and it must still drain
    /// events an earlier failed pump left in the outbox.
    async fn after_commit(&self) {
        match self.options.relay_mode {
            RelayMode::Inline => self.drain().await,
            RelayMode::Background => self.relay.notify(),
        }
    }

    /// In inline mode, relay anything still queued before a notification read.
    async fn catch_up(&self) {
        if self.options.relay_mode == RelayMode::Inline {
            self.drain().await;
        }
    }

    async fn drain(&self) {
        if let Err(err) = self.relay.pump().await {
            tracing::warn!(error = %err, "inline relay failed, events stay queued in outbox");
        }
    }

    /// See [`TransitionAuthority::submit_application`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn submit_application(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
        message: Option<String>,
    ) -> Result<Application, MatchError> {
        let result = self
            .authority
            .submit_application(actor, opportunity_id, message)
            .await;
        self.after_commit().await;
        result
    }

    /// See [`TransitionAuthority::decide`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn decide(
        &self,
        application_id: ApplicationId,
        decision: Decision,
        actor: &Actor,
    ) -> Result<Transition, MatchError> {
        let result = self.authority.decide(application_id, decision, actor).await;
        self.after_commit().await;
        result
    }

    /// See [`TransitionAuthority::withdraw`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn withdraw(
        &self,
        application_id: ApplicationId,
        actor: &Actor,
    ) -> Result<Transition, MatchError> {
        let result = self.authority.withdraw(application_id, actor).await;
        self.after_commit().await;
        result
    }

    /// See [`TransitionAuthority::create_opportunity`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn create_opportunity(
        &self,
        actor: &Actor,
        new: NewOpportunity,
    ) -> Result<Opportunity, MatchError> {
        self.authority.create_opportunity(actor, new).await
    }

    /// See [`TransitionAuthority::set_max_participants`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn set_max_participants(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
        max_participants: u32,
    ) -> Result<Opportunity, MatchError> {
        self.authority
            .set_max_participants(actor, opportunity_id, max_participants)
            .await
    }

    /// See [`TransitionAuthority::close_opportunity`].
    ///
    /// # Errors
    ///
    /// Any error of the underlying authority call.
    pub async fn close_opportunity(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
    ) -> Result<Opportunity, MatchError> {
        self.authority.close_opportunity(actor, opportunity_id).await
    }

    /// Open a live notification stream for a recipient.
    ///
    /// # Errors
    ///
    /// Store failures while loading the backlog.
    pub async fn subscribe(&self, recipient: UserId) -> Result<Subscription, MatchError> {
        self.catch_up().await;
        self.fanout.subscribe(recipient).await
    }

    /// Mark one of the recipient's notifications read.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotAuthorized`, or store failures.
    pub async fn mark_read(
        &self,
        notification_id: NotificationId,
        recipient: UserId,
    ) -> Result<MarkRead, MatchError> {
        self.fanout.mark_read(notification_id, recipient).await
    }

    /// Unread notification count for a recipient.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError> {
        self.catch_up().await;
        self.fanout.unread_count(recipient).await
    }

    /// The recipient's most recent notifications, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn recent_notifications(&self, recipient: UserId) -> Result<Vec<Notification>, MatchError> {
        self.catch_up().await;
        self.fanout.recent(recipient, self.options.recent_limit).await
    }

    /// See [`DashboardProjector::roster`].
    ///
    /// # Errors
    ///
    /// `NotFound` or store failures.
    pub async fn roster(&self, opportunity_id: OpportunityId) -> Result<Roster, MatchError> {
        self.projector.roster(opportunity_id).await
    }

    /// See [`DashboardProjector::history`].
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn history(&self, volunteer_id: UserId) -> Result<Vec<HistoryEntry>, MatchError> {
        self.projector.history(volunteer_id).await
    }

    /// See [`DashboardProjector::dashboard`].
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn dashboard(&self, actor: &Actor) -> Result<DashboardView, MatchError> {
        self.projector.dashboard(actor).await
    }

    /// See [`DashboardProjector::browse`].
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn browse(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, MatchError> {
        self.projector.browse(filter).await
    }
}

impl<S, N> Drop for Engine<S, N> {
    fn drop(&mut self) {
        self.relay.shutdown();
    }
}
