//! Domain records: opportunities, applications, notifications, and actors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::ids::{
    ApplicationId, EventId, NotificationId, OpportunityId, OrganizationId, UserId,
};

/// Lifecycle status of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    /// Accepting applications with at least one open slot.
    Active,
    /// Every slot is taken.
    Full,
    /// Closed by the owning organization. Terminal.
    Closed,
}

/// A capacity-limited volunteering engagement posted by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Opportunity identifier.
    pub id: OpportunityId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Short title shown in listings and notifications.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Where the engagement takes place.
    pub location: String,
    /// Category used for browsing.
    pub category: String,
    /// Slot count; never below `current_participants`.
    pub max_participants: u32,
    /// Approved participants. Written only inside a transition.
    pub current_participants: u32,
    /// Current lifecycle status.
    pub status: OpportunityStatus,
    /// Creation time (ms since epoch).
    pub created_at_ms: u64,
}

impl Opportunity {
    /// Remaining open slots.
    #[must_use]
    pub const fn open_slots(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }
}

/// Fields supplied by an organization when publishing an opportunity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOpportunity {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Location.
    pub location: String,
    /// Category.
    pub category: String,
    /// Slot count; must be positive.
    pub max_participants: u32,
}

/// Status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved; holds one slot.
    Approved,
    /// Rejected. Terminal.
    Rejected,
    /// Withdrawn by the volunteer after approval. Terminal.
    Withdrawn,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        };
        f.write_str(s)
    }
}

/// A volunteer's request to fill one slot of an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application identifier.
    pub id: ApplicationId,
    /// Applying volunteer.
    pub volunteer_id: UserId,
    /// Target opportunity.
    pub opportunity_id: OpportunityId,
    /// Optional note from the volunteer.
    pub message: Option<String>,
    /// Current status.
    pub status: ApplicationStatus,
    /// Submission time (ms since epoch). Immutable.
    pub applied_at_ms: u64,
    /// Time of the last status change (ms since epoch).
    pub updated_at_ms: u64,
}

/// Organization decision on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Approve and take a slot.
    Approve,
    /// Reject without touching capacity.
    Reject,
}

impl Decision {
    /// Application status this decision leads to.
    #[must_use]
    pub const fn target_status(self) -> ApplicationStatus {
        match self {
            Self::Approve => ApplicationStatus::Approved,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// A recipient-addressed notification materialized from a domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Addressed user.
    pub recipient_id: UserId,
    /// Domain event this notification was produced from.
    pub event_id: EventId,
    /// Human-readable text.
    pub message: String,
    /// Optional deep link into the UI.
    pub link_to: Option<String>,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation time (ms since epoch).
    pub created_at_ms: u64,
}

/// Organization directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
    /// Staff users who act for and are notified on behalf of the organization.
    pub staff: Vec<UserId>,
}

/// Capability attached to an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum Role {
    /// Applies to opportunities.
    Volunteer,
    /// Publishes opportunities and decides applications for one organization.
    OrganizationStaff {
        /// Organization the staff member acts for.
        organization_id: OrganizationId,
    },
}

/// Verified identity handed over by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated user.
    pub user_id: UserId,
    /// Capability the user acts with.
    pub role: Role,
}

impl Actor {
    /// Actor acting as a volunteer.
    #[must_use]
    pub const fn volunteer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Volunteer,
        }
    }

    /// Actor acting as staff of `organization_id`.
    #[must_use]
    pub const fn staff(user_id: UserId, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            role: Role::OrganizationStaff { organization_id },
        }
    }

    /// The volunteer identity, if acting as a volunteer.
    #[must_use]
    pub const fn as_volunteer(&self) -> Option<UserId> {
        match self.role {
            Role::Volunteer => Some(self.user_id),
            Role::OrganizationStaff { .. } => None,
        }
    }

    /// The organization, if acting as staff.
    #[must_use]
    pub const fn organization(&self) -> Option<OrganizationId> {
        match self.role {
            Role::OrganizationStaff { organization_id } => Some(organization_id),
            Role::Volunteer => None,
        }
    }
}
