//! Error types for engine operations.

use thiserror::Error;

use super::model::ApplicationStatus;

/// Errors produced by the transition authority, stores, and fan-out.
///
/// The first six variants are domain-rule rejections: they describe a fact about
/// the data and retrying does not change the outcome. Only
/// [`MatchError::StoreUnavailable`] is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The volunteer already has an application for this opportunity.
    #[error("duplicate application for this opportunity")]
    DuplicateApplication,
    /// The opportunity is not accepting applications or approvals.
    #[error("opportunity unavailable")]
    OpportunityUnavailable,
    /// Every slot of the opportunity is taken.
    #[error("opportunity full")]
    OpportunityFull,
    /// The actor may not perform this operation.
    #[error("not authorized")]
    NotAuthorized,
    /// The application already carries a terminal decision.
    #[error("application already decided")]
    AlreadyDecided,
    /// The requested status edge does not exist in the state machine.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ApplicationStatus,
        /// Requested status.
        to: ApplicationStatus,
    },
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (opportunity, application, notification, organization).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
    /// A capacity edit would break `current_participants <= max_participants`.
    #[error("invalid capacity {requested}: {current} participants already approved")]
    InvalidCapacity {
        /// Requested `max_participants`.
        requested: u32,
        /// Approved participants at the time of the edit.
        current: u32,
    },
    /// Transient infrastructure failure; safe to retry the whole operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// An internal invariant was violated. Indicates a programming error.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl MatchError {
    /// Build a [`MatchError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether a caller may retry the operation with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Whether this is a domain-rule rejection to surface to the user.
    #[must_use]
    pub const fn is_domain_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateApplication
                | Self::OpportunityUnavailable
                | Self::OpportunityFull
                | Self::NotAuthorized
                | Self::AlreadyDecided
                | Self::InvalidTransition { .. }
        )
    }

    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateApplication => "duplicate_application",
            Self::OpportunityUnavailable => "opportunity_unavailable",
            Self::OpportunityFull => "opportunity_full",
            Self::NotAuthorized => "not_authorized",
            Self::AlreadyDecided => "already_decided",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NotFound { .. } => "not_found",
            Self::InvalidCapacity { .. } => "invalid_capacity",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
