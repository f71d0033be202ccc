//! Storage collaborator contracts.
//!
//! The engine never touches rows directly. It runs closures inside
//! [`ApplicationStore::transact`], which commits or discards every staged change
//! (rows and outbox events) as one unit, and reads notifications through
//! [`NotificationStore`].

use async_trait::async_trait;

use super::error::MatchError;
use super::event::DomainEvent;
use super::model::{Application, Notification, Opportunity, Organization};
use crate::util::ids::{ApplicationId, NotificationId, OpportunityId, OrganizationId, UserId};

/// Staged view of one opportunity row and its applications inside a transaction.
///
/// Changes become visible to other callers only if the closure returns `Ok`.
pub trait Transaction {
    /// The opportunity row.
    fn opportunity(&self) -> &Opportunity;
    /// Mutable access to the opportunity row.
    fn opportunity_mut(&mut self) -> &mut Opportunity;
    /// An application of this opportunity, including ones staged in this transaction.
    fn application(&self, id: ApplicationId) -> Option<&Application>;
    /// Stage an update of an existing application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the application does not belong to this opportunity.
    fn update_application(&mut self, application: Application) -> Result<(), MatchError>;
    /// Stage a new application, enforcing the (volunteer, opportunity) unique index.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateApplication` if the volunteer already has an application
    /// for this opportunity, committed or staged.
    fn insert_application(&mut self, application: Application) -> Result<(), MatchError>;
    /// Stage an outbox event, published only if the transaction commits.
    fn emit(&mut self, event: DomainEvent);
}

/// Opportunities, applications, and the event outbox.
#[async_trait]
pub trait ApplicationStore: Send + Sync + 'static {
    /// Insert a new opportunity row.
    async fn insert_opportunity(&self, opportunity: Opportunity) -> Result<(), MatchError>;

    /// Fetch an opportunity.
    async fn opportunity(&self, id: OpportunityId) -> Result<Option<Opportunity>, MatchError>;

    /// Opportunities owned by an organization, newest first.
    async fn opportunities_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Opportunity>, MatchError>;

    /// Every opportunity with status `active`.
    async fn active_opportunities(&self) -> Result<Vec<Opportunity>, MatchError>;

    /// Opportunity an application belongs to. This never changes after insert.
    async fn locate_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<OpportunityId>, MatchError>;

    /// Fetch an application.
    async fn application(&self, id: ApplicationId) -> Result<Option<Application>, MatchError>;

    /// Applications for one opportunity, oldest first.
    async fn applications_for_opportunity(
        &self,
        opportunity_id: OpportunityId,
    ) -> Result<Vec<Application>, MatchError>;

    /// Applications submitted by one volunteer, newest first.
    async fn applications_for_volunteer(
        &self,
        volunteer_id: UserId,
    ) -> Result<Vec<Application>, MatchError>;

    /// Run `op` as one serializable transaction scoped to an opportunity row.
    ///
    /// Transactions on the same opportunity are strictly ordered; transactions on
    /// different opportunities never wait for each other. `op` runs without any
    /// suspension point so no lock is held across I/O.
    async fn transact<T, F>(&self, opportunity_id: OpportunityId, op: F) -> Result<T, MatchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Transaction) -> Result<T, MatchError> + Send + 'static;

    /// Committed outbox events with `sequence > after`, in sequence order.
    async fn events_after(&self, after: u64, limit: usize) -> Result<Vec<DomainEvent>, MatchError>;
}

/// Organization membership lookup.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// Fetch an organization.
    async fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, MatchError>;
}

/// Outcome of marking a notification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkRead {
    /// The flag flipped from unread to read.
    Marked,
    /// The notification was already read.
    AlreadyRead,
}

/// Persistent notification records with an (event, recipient) dedup index.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert unless a notification for the same event and recipient exists.
    ///
    /// Returns `true` if the record was inserted.
    async fn insert_once(&self, notification: Notification) -> Result<bool, MatchError>;

    /// Most recent notifications for a recipient, newest first.
    async fn recent(&self, recipient: UserId, limit: usize) -> Result<Vec<Notification>, MatchError>;

    /// Unread notifications for a recipient, oldest first.
    async fn unread(&self, recipient: UserId) -> Result<Vec<Notification>, MatchError>;

    /// Number of unread notifications for a recipient.
    async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError>;

    /// Flip `is_read` on a notification owned by `recipient`.
    async fn mark_read(&self, id: NotificationId, recipient: UserId) -> Result<MarkRead, MatchError>;
}
