//! Domain events recorded alongside committed transitions.

use serde::{Deserialize, Serialize};

use super::model::{Application, ApplicationStatus, Opportunity};
use crate::util::clock::now_ms;
use crate::util::ids::{ApplicationId, EventId, OpportunityId, OrganizationId, UserId};

/// What a committed transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A volunteer submitted a new application.
    ApplicationSubmitted,
    /// An organization approved or rejected an application.
    ApplicationDecided,
    /// A volunteer withdrew an approved application.
    ApplicationWithdrawn,
}

/// Immutable record of a committed state change.
///
/// `sequence` is assigned by the store at commit time and orders the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event identifier, half of the fan-out idempotency key.
    pub id: EventId,
    /// Position in the store outbox. Zero until committed.
    pub sequence: u64,
    /// Event kind.
    pub kind: EventKind,
    /// User who caused the change.
    pub actor_id: UserId,
    /// Affected application.
    pub application_id: ApplicationId,
    /// Affected opportunity.
    pub opportunity_id: OpportunityId,
    /// Title of the opportunity at the time of the change.
    pub opportunity_title: String,
    /// Organization owning the opportunity.
    pub organization_id: OrganizationId,
    /// Volunteer owning the application.
    pub volunteer_id: UserId,
    /// Application status after the change.
    pub status: ApplicationStatus,
    /// Time of the change (ms since epoch).
    pub occurred_at_ms: u64,
}

impl DomainEvent {
    /// Describe a change to `application` made by `actor_id`.
    #[must_use]
    pub fn new(
        kind: EventKind,
        actor_id: UserId,
        application: &Application,
        opportunity: &Opportunity,
    ) -> Self {
        Self {
            id: EventId::new(),
            sequence: 0,
            kind,
            actor_id,
            application_id: application.id,
            opportunity_id: opportunity.id,
            opportunity_title: opportunity.title.clone(),
            organization_id: opportunity.organization_id,
            volunteer_id: application.volunteer_id,
            status: application.status,
            occurred_at_ms: now_ms(),
        }
    }
}
