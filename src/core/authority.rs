//! Transition authority: the only component that mutates application status or
//! opportunity capacity.
//!
//! Every operation is a single call to [`ApplicationStore::transact`]. Preconditions
//! are checked against the row as it is inside the transaction, never against an
//! earlier read, so concurrent callers cannot overbook an opportunity or decide an
//! application twice.
//!
//! ```text
//!  pending ──approve──▶ approved ──withdraw──▶ withdrawn
//!     │
//!     └────reject────▶ rejected
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::MatchError;
use super::event::{DomainEvent, EventKind};
use super::ledger::{self, Reservation};
use super::model::{
    Actor, Application, ApplicationStatus, Decision, NewOpportunity, Opportunity,
    OpportunityStatus,
};
use super::store::ApplicationStore;
use crate::util::clock::now_ms;
use crate::util::ids::{ApplicationId, OpportunityId};

/// How to answer a request whose target status the application already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Succeed without changing anything.
    #[default]
    NoOp,
    /// Fail with `AlreadyDecided` (or `InvalidTransition` for withdrawals).
    Reject,
}

/// Result of a status transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The status changed and an event was recorded.
    Applied(Application),
    /// The application already had the requested status; nothing changed.
    Unchanged(Application),
}

impl Transition {
    /// The application as committed.
    #[must_use]
    pub const fn application(&self) -> &Application {
        match self {
            Self::Applied(app) | Self::Unchanged(app) => app,
        }
    }

    /// Consume into the committed application.
    #[must_use]
    pub fn into_application(self) -> Application {
        match self {
            Self::Applied(app) | Self::Unchanged(app) => app,
        }
    }

    /// Whether the status changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Owns the application state machine and the capacity ledger writes.
pub struct TransitionAuthority<S> {
    store: Arc<S>,
    repeat: RepeatPolicy,
}

impl<S> Clone for TransitionAuthority<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            repeat: self.repeat,
        }
    }
}

impl<S: ApplicationStore> TransitionAuthority<S> {
    /// Create an authority over `store`.
    pub const fn new(store: Arc<S>, repeat: RepeatPolicy) -> Self {
        Self { store, repeat }
    }

    /// Policy applied to repeated terminal transitions.
    pub const fn repeat_policy(&self) -> RepeatPolicy {
        self.repeat
    }

    /// Create a pending application for the acting volunteer.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless acting as a volunteer, `NotFound` for an unknown
    /// opportunity, `OpportunityUnavailable` unless it is active,
    /// `DuplicateApplication` if the volunteer already applied.
    pub async fn submit_application(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
        message: Option<String>,
    ) -> Result<Application, MatchError> {
        let volunteer_id = actor.as_volunteer().ok_or(MatchError::NotAuthorized)?;
        let message = message
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());

        let result = self
            .store
            .transact(opportunity_id, move |txn| {
                let opportunity = txn.opportunity();
                if opportunity.status != OpportunityStatus::Active {
                    return Err(MatchError::OpportunityUnavailable);
                }
                let now = now_ms();
                let application = Application {
                    id: ApplicationId::new(),
                    volunteer_id,
                    opportunity_id,
                    message,
                    status: ApplicationStatus::Pending,
                    applied_at_ms: now,
                    updated_at_ms: now,
                };
                let event = DomainEvent::new(
                    EventKind::ApplicationSubmitted,
                    volunteer_id,
                    &application,
                    opportunity,
                );
                txn.insert_application(application.clone())?;
                txn.emit(event);
                Ok(application)
            })
            .await;

        match &result {
            Ok(app) => tracing::info!(
                application_id = %app.id,
                opportunity_id = %opportunity_id,
                volunteer_id = %volunteer_id,
                "application submitted"
            ),
            Err(err) => tracing::debug!(
                opportunity_id = %opportunity_id,
                volunteer_id = %volunteer_id,
                error = %err,
                "application rejected"
            ),
        }
        result
    }

    /// Approve or reject a pending application on behalf of its organization.
    ///
    /// Approval reserves a slot in the same transaction; when none is left the
    /// call fails with `OpportunityFull` and the application stays pending.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless acting as staff of the owning organization,
    /// `AlreadyDecided` for a conflicting (or, under [`RepeatPolicy::Reject`],
    /// repeated) decision, `InvalidTransition` on a withdrawn application,
    /// `OpportunityUnavailable` when approving on a closed opportunity,
    /// `OpportunityFull` when no slot is left.
    pub async fn decide(
        &self,
        application_id: ApplicationId,
        decision: Decision,
        actor: &Actor,
    ) -> Result<Transition, MatchError> {
        let organization_id = actor.organization().ok_or(MatchError::NotAuthorized)?;
        let actor_id = actor.user_id;
        let opportunity_id = self.locate(application_id).await?;
        let repeat = self.repeat;

        let result = self
            .store
            .transact(opportunity_id, move |txn| {
                if txn.opportunity().organization_id != organization_id {
                    return Err(MatchError::NotAuthorized);
                }
                let mut application = txn
                    .application(application_id)
                    .cloned()
                    .ok_or_else(|| MatchError::not_found("application", application_id))?;
                let target = decision.target_status();

                match application.status {
                    ApplicationStatus::Pending => {}
                    current if current == target => {
                        return match repeat {
                            RepeatPolicy::NoOp => Ok(Transition::Unchanged(application)),
                            RepeatPolicy::Reject => Err(MatchError::AlreadyDecided),
                        };
                    }
                    ApplicationStatus::Approved | ApplicationStatus::Rejected => {
                        return Err(MatchError::AlreadyDecided);
                    }
                    ApplicationStatus::Withdrawn => {
                        return Err(MatchError::InvalidTransition {
                            from: ApplicationStatus::Withdrawn,
                            to: target,
                        });
                    }
                }

                if decision == Decision::Approve {
                    if txn.opportunity().status == OpportunityStatus::Closed {
                        return Err(MatchError::OpportunityUnavailable);
                    }
                    if ledger::try_reserve_slot(txn.opportunity_mut()) == Reservation::Full {
                        return Err(MatchError::OpportunityFull);
                    }
                }

                application.status = target;
                application.updated_at_ms = now_ms();
                txn.update_application(application.clone())?;
                let event = DomainEvent::new(
                    EventKind::ApplicationDecided,
                    actor_id,
                    &application,
                    txn.opportunity(),
                );
                txn.emit(event);
                Ok(Transition::Applied(application))
            })
            .await;

        match &result {
            Ok(Transition::Applied(app)) => tracing::info!(
                application_id = %application_id,
                opportunity_id = %opportunity_id,
                status = %app.status,
                "application decided"
            ),
            Ok(Transition::Unchanged(_)) => tracing::debug!(
                application_id = %application_id,
                "repeated decision ignored"
            ),
            Err(MatchError::OpportunityFull) => tracing::warn!(
                application_id = %application_id,
                opportunity_id = %opportunity_id,
                "approval refused: opportunity full"
            ),
            Err(err) => tracing::debug!(
                application_id = %application_id,
                error = %err,
                "decision rejected"
            ),
        }
        result
    }

    /// Withdraw an approved application, releasing its slot.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless the acting volunteer owns the application,
    /// `InvalidTransition` unless it is approved (or already withdrawn under
    /// [`RepeatPolicy::NoOp`]).
    pub async fn withdraw(
        &self,
        application_id: ApplicationId,
        actor: &Actor,
    ) -> Result<Transition, MatchError> {
        let volunteer_id = actor.as_volunteer().ok_or(MatchError::NotAuthorized)?;
        let opportunity_id = self.locate(application_id).await?;
        let repeat = self.repeat;

        let result = self
            .store
            .transact(opportunity_id, move |txn| {
                let mut application = txn
                    .application(application_id)
                    .cloned()
                    .ok_or_else(|| MatchError::not_found("application", application_id))?;
                if application.volunteer_id != volunteer_id {
                    return Err(MatchError::NotAuthorized);
                }
                match application.status {
                    ApplicationStatus::Approved => {}
                    ApplicationStatus::Withdrawn if repeat == RepeatPolicy::NoOp => {
                        return Ok(Transition::Unchanged(application));
                    }
                    from => {
                        return Err(MatchError::InvalidTransition {
                            from,
                            to: ApplicationStatus::Withdrawn,
                        });
                    }
                }

                ledger::release_slot(txn.opportunity_mut())?;
                application.status = ApplicationStatus::Withdrawn;
                application.updated_at_ms = now_ms();
                txn.update_application(application.clone())?;
                let event = DomainEvent::new(
                    EventKind::ApplicationWithdrawn,
                    volunteer_id,
                    &application,
                    txn.opportunity(),
                );
                txn.emit(event);
                Ok(Transition::Applied(application))
            })
            .await;

        if let Ok(Transition::Applied(_)) = &result {
            tracing::info!(
                application_id = %application_id,
                opportunity_id = %opportunity_id,
                "application withdrawn"
            );
        }
        result
    }

    /// Publish a new opportunity for the acting organization.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless acting as staff, `InvalidCapacity` for zero slots.
    pub async fn create_opportunity(
        &self,
        actor: &Actor,
        new: NewOpportunity,
    ) -> Result<Opportunity, MatchError> {
        let organization_id = actor.organization().ok_or(MatchError::NotAuthorized)?;
        if new.max_participants == 0 {
            return Err(MatchError::InvalidCapacity {
                requested: 0,
                current: 0,
            });
        }
        let opportunity = Opportunity {
            id: OpportunityId::new(),
            organization_id,
            title: new.title,
            description: new.description,
            location: new.location,
            category: new.category,
            max_participants: new.max_participants,
            current_participants: 0,
            status: OpportunityStatus::Active,
            created_at_ms: now_ms(),
        };
        self.store.insert_opportunity(opportunity.clone()).await?;
        tracing::info!(
            opportunity_id = %opportunity.id,
            organization_id = %organization_id,
            max_participants = opportunity.max_participants,
            "opportunity created"
        );
        Ok(opportunity)
    }

    /// Change the slot count of an owned, open opportunity.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` for non-owners, `OpportunityUnavailable` once closed,
    /// `InvalidCapacity` when `max_participants` would drop below the approved count.
    pub async fn set_max_participants(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
        max_participants: u32,
    ) -> Result<Opportunity, MatchError> {
        let organization_id = actor.organization().ok_or(MatchError::NotAuthorized)?;
        let updated = self
            .store
            .transact(opportunity_id, move |txn| {
                let opportunity = txn.opportunity_mut();
                if opportunity.organization_id != organization_id {
                    return Err(MatchError::NotAuthorized);
                }
                if opportunity.status == OpportunityStatus::Closed {
                    return Err(MatchError::OpportunityUnavailable);
                }
                ledger::resize(opportunity, max_participants)?;
                Ok(opportunity.clone())
            })
            .await?;
        tracing::info!(
            opportunity_id = %opportunity_id,
            max_participants,
            "opportunity capacity changed"
        );
        Ok(updated)
    }

    /// Close an owned opportunity. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` for non-owners.
    pub async fn close_opportunity(
        &self,
        actor: &Actor,
        opportunity_id: OpportunityId,
    ) -> Result<Opportunity, MatchError> {
        let organization_id = actor.organization().ok_or(MatchError::NotAuthorized)?;
        let closed = self
            .store
            .transact(opportunity_id, move |txn| {
                let opportunity = txn.opportunity_mut();
                if opportunity.organization_id != organization_id {
                    return Err(MatchError::NotAuthorized);
                }
                opportunity.status = OpportunityStatus::Closed;
                Ok(opportunity.clone())
            })
            .await?;
        tracing::info!(opportunity_id = %opportunity_id, "opportunity closed");
        Ok(closed)
    }

    async fn locate(&self, application_id: ApplicationId) -> Result<OpportunityId, MatchError> {
        self.store
            .locate_application(application_id)
            .await?
            .ok_or_else(|| MatchError::not_found("application", application_id))
    }
}
