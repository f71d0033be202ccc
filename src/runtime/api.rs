//! API-facing request/response models.
//!
//! The transport layer deserializes a request, attaches the [`Actor`] verified by
//! the auth collaborator, and serializes either the response or an [`ErrorBody`].

use serde::{Deserialize, Serialize};

use crate::core::{
    Actor, Application, ApplicationStore, Decision, Directory, Engine, MarkRead, MatchError,
    NotificationStore, Transition,
};
use crate::util::ids::{ApplicationId, NotificationId, OpportunityId};

/// Volunteer applying to an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplicationRequest {
    /// Target opportunity.
    pub opportunity_id: OpportunityId,
    /// Optional note to the organization.
    #[serde(default)]
    pub message: Option<String>,
}

/// Organization deciding an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideRequest {
    /// Application to decide.
    pub application_id: ApplicationId,
    /// Approve or reject.
    pub decision: Decision,
}

/// Volunteer withdrawing an approved application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Application to withdraw.
    pub application_id: ApplicationId,
}

/// Recipient marking a notification read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    /// Notification to mark.
    pub notification_id: NotificationId,
}

/// Application state after a mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    /// The application as committed.
    pub application: Application,
    /// Whether this call changed it.
    pub changed: bool,
}

impl From<Transition> for ApplicationResponse {
    fn from(transition: Transition) -> Self {
        let changed = transition.changed();
        Self {
            application: transition.into_application(),
            changed,
        }
    }
}

/// Result of marking a notification read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Whether this call flipped the flag.
    pub changed: bool,
    /// Unread count after the call.
    pub unread_count: u64,
}

/// Error payload returned to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code, e.g. `opportunity_full`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the client may retry with backoff.
    pub retryable: bool,
}

impl From<&MatchError> for ErrorBody {
    fn from(err: &MatchError) -> Self {
        Self {
            kind: err.kind().to_owned(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<MatchError> for ErrorBody {
    fn from(err: MatchError) -> Self {
        Self::from(&err)
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Overall health.
    pub ok: bool,
}

/// Handle a submit request.
///
/// # Errors
///
/// Any engine error, as an [`ErrorBody`].
pub async fn submit_application<S, N>(
    engine: &Engine<S, N>,
    actor: &Actor,
    req: SubmitApplicationRequest,
) -> Result<ApplicationResponse, ErrorBody>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    let application = engine
        .submit_application(actor, req.opportunity_id, req.message)
        .await?;
    Ok(ApplicationResponse {
        application,
        changed: true,
    })
}

/// Handle a decide request.
///
/// # Errors
///
/// Any engine error, as an [`ErrorBody`].
pub async fn decide<S, N>(
    engine: &Engine<S, N>,
    actor: &Actor,
    req: DecideRequest,
) -> Result<ApplicationResponse, ErrorBody>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    Ok(engine
        .decide(req.application_id, req.decision, actor)
        .await?
        .into())
}

/// Handle a withdraw request.
///
/// # Errors
///
/// Any engine error, as an [`ErrorBody`].
pub async fn withdraw<S, N>(
    engine: &Engine<S, N>,
    actor: &Actor,
    req: WithdrawRequest,
) -> Result<ApplicationResponse, ErrorBody>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    Ok(engine.withdraw(req.application_id, actor).await?.into())
}

/// Handle a mark-read request for the acting user.
///
/// # Errors
///
/// Any engine error, as an [`ErrorBody`].
pub async fn mark_read<S, N>(
    engine: &Engine<S, N>,
    actor: &Actor,
    req: MarkReadRequest,
) -> Result<MarkReadResponse, ErrorBody>
where
    S: ApplicationStore + Directory,
    N: NotificationStore,
{
    let outcome = engine.mark_read(req.notification_id, actor.user_id).await?;
    let unread_count = engine.unread_count(actor.user_id).await?;
    Ok(MarkReadResponse {
        changed: outcome == MarkRead::Marked,
        unread_count,
    })
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}
