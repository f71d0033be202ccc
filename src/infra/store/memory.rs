//! In-memory transactional store.
//!
//! Each opportunity and its applications live in one row guarded by its own
//! `parking_lot::Mutex`. A transaction locks exactly that row, works on a staged
//! copy, and writes rows and outbox events back only when the closure succeeds.
//! The row map itself sits behind an `RwLock` that is held only long enough to
//! clone the row handle, so unrelated opportunities never wait for each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::core::{
    Application, ApplicationStore, Directory, DomainEvent, MatchError, Opportunity,
    OpportunityStatus, Organization, Transaction,
};
use crate::util::ids::{ApplicationId, OpportunityId, OrganizationId, UserId};

struct OpportunityRow {
    opportunity: Opportunity,
    applications: HashMap<ApplicationId, Application>,
    /// Unique index on (volunteer, opportunity), scoped to this row.
    by_volunteer: HashMap<UserId, ApplicationId>,
}

#[derive(Default)]
struct Outbox {
    events: Vec<DomainEvent>,
    next_sequence: u64,
}

/// In-memory implementation of [`ApplicationStore`] and [`Directory`].
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<OpportunityId, Arc<Mutex<OpportunityRow>>>>,
    application_index: RwLock<HashMap<ApplicationId, OpportunityId>>,
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
    outbox: Mutex<Outbox>,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an organization in the directory.
    pub fn put_organization(&self, organization: Organization) {
        self.organizations.write().insert(organization.id, organization);
    }

    /// Simulate an outage: while offline every call fails with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), MatchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MatchError::StoreUnavailable("memory store offline".into()));
        }
        Ok(())
    }

    fn row(&self, id: OpportunityId) -> Result<Arc<Mutex<OpportunityRow>>, MatchError> {
        self.rows
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| MatchError::not_found("opportunity", id))
    }

    fn all_rows(&self) -> Vec<Arc<Mutex<OpportunityRow>>> {
        self.rows.read().values().cloned().collect()
    }

    fn transact_sync<T, F>(&self, opportunity_id: OpportunityId, op: F) -> Result<T, MatchError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, MatchError>,
    {
        self.ensure_online()?;
        let row = self.row(opportunity_id)?;
        let mut row = row.lock();

        let mut staged = StagedTxn {
            row: &*row,
            opportunity: row.opportunity.clone(),
            updates: HashMap::new(),
            inserts: Vec::new(),
            events: Vec::new(),
        };
        let txn: &mut dyn Transaction = &mut staged;
        let value = op(txn)?;
        let StagedTxn {
            opportunity,
            updates,
            inserts,
            events,
            ..
        } = staged;

        debug_assert!(opportunity.current_participants <= opportunity.max_participants);
        row.opportunity = opportunity;
        row.applications.extend(updates);
        if !inserts.is_empty() {
            let mut index = self.application_index.write();
            for application in inserts {
                index.insert(application.id, opportunity_id);
                row.by_volunteer.insert(application.volunteer_id, application.id);
                row.applications.insert(application.id, application);
            }
        }
        if !events.is_empty() {
            // Appended while the row lock is held so per-opportunity event order
            // matches commit order.
            let mut outbox = self.outbox.lock();
            for mut event in events {
                outbox.next_sequence += 1;
                event.sequence = outbox.next_sequence;
                outbox.events.push(event);
            }
        }
        Ok(value)
    }
}

struct StagedTxn<'r> {
    row: &'r OpportunityRow,
    opportunity: Opportunity,
    updates: HashMap<ApplicationId, Application>,
    inserts: Vec<Application>,
    events: Vec<DomainEvent>,
}

impl Transaction for StagedTxn<'_> {
    fn opportunity(&self) -> &Opportunity {
        &self.opportunity
    }

    fn opportunity_mut(&mut self) -> &mut Opportunity {
        &mut self.opportunity
    }

    fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.updates
            .get(&id)
            .or_else(|| self.inserts.iter().find(|a| a.id == id))
            .or_else(|| self.row.applications.get(&id))
    }

    fn update_application(&mut self, application: Application) -> Result<(), MatchError> {
        if let Some(staged) = self.inserts.iter_mut().find(|a| a.id == application.id) {
            *staged = application;
            return Ok(());
        }
        if !self.row.applications.contains_key(&application.id) {
            return Err(MatchError::not_found("application", application.id));
        }
        self.updates.insert(application.id, application);
        Ok(())
    }

    fn insert_application(&mut self, application: Application) -> Result<(), MatchError> {
        if application.opportunity_id != self.opportunity.id {
            return Err(MatchError::Internal(format!(
                "application {} inserted into opportunity {}",
                application.id, self.opportunity.id
            )));
        }
        let volunteer = application.volunteer_id;
        if self.row.by_volunteer.contains_key(&volunteer)
            || self.inserts.iter().any(|a| a.volunteer_id == volunteer)
        {
            return Err(MatchError::DuplicateApplication);
        }
        self.inserts.push(application);
        Ok(())
    }

    fn emit(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_opportunity(&self, opportunity: Opportunity) -> Result<(), MatchError> {
        self.ensure_online()?;
        if opportunity.max_participants == 0
            || opportunity.current_participants > opportunity.max_participants
        {
            return Err(MatchError::InvalidCapacity {
                requested: opportunity.max_participants,
                current: opportunity.current_participants,
            });
        }
        let mut rows = self.rows.write();
        if rows.contains_key(&opportunity.id) {
            return Err(MatchError::Internal(format!(
                "opportunity {} already exists",
                opportunity.id
            )));
        }
        rows.insert(
            opportunity.id,
            Arc::new(Mutex::new(OpportunityRow {
                opportunity,
                applications: HashMap::new(),
                by_volunteer: HashMap::new(),
            })),
        );
        Ok(())
    }

    async fn opportunity(&self, id: OpportunityId) -> Result<Option<Opportunity>, MatchError> {
        self.ensure_online()?;
        let Some(row) = self.rows.read().get(&id).cloned() else {
            return Ok(None);
        };
        let opportunity = row.lock().opportunity.clone();
        Ok(Some(opportunity))
    }

    async fn opportunities_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Opportunity>, MatchError> {
        self.ensure_online()?;
        let mut found: Vec<Opportunity> = self
            .all_rows()
            .iter()
            .map(|row| row.lock().opportunity.clone())
            .filter(|opp| opp.organization_id == organization_id)
            .collect();
        found.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(found)
    }

    async fn active_opportunities(&self) -> Result<Vec<Opportunity>, MatchError> {
        self.ensure_online()?;
        Ok(self
            .all_rows()
            .iter()
            .map(|row| row.lock().opportunity.clone())
            .filter(|opp| opp.status == OpportunityStatus::Active)
            .collect())
    }

    async fn locate_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<OpportunityId>, MatchError> {
        self.ensure_online()?;
        Ok(self.application_index.read().get(&id).copied())
    }

    async fn application(&self, id: ApplicationId) -> Result<Option<Application>, MatchError> {
        self.ensure_online()?;
        let Some(opportunity_id) = self.application_index.read().get(&id).copied() else {
            return Ok(None);
        };
        let row = self.row(opportunity_id)?;
        let application = row.lock().applications.get(&id).cloned();
        Ok(application)
    }

    async fn applications_for_opportunity(
        &self,
        opportunity_id: OpportunityId,
    ) -> Result<Vec<Application>, MatchError> {
        self.ensure_online()?;
        let row = self.row(opportunity_id)?;
        let mut applications: Vec<Application> =
            row.lock().applications.values().cloned().collect();
        applications.sort_by(|a, b| a.applied_at_ms.cmp(&b.applied_at_ms));
        Ok(applications)
    }

    async fn applications_for_volunteer(
        &self,
        volunteer_id: UserId,
    ) -> Result<Vec<Application>, MatchError> {
        self.ensure_online()?;
        let mut applications: Vec<Application> = self
            .all_rows()
            .iter()
            .filter_map(|row| {
                let row = row.lock();
                row.by_volunteer
                    .get(&volunteer_id)
                    .and_then(|id| row.applications.get(id))
                    .cloned()
            })
            .collect();
        applications.sort_by(|a, b| b.applied_at_ms.cmp(&a.applied_at_ms));
        Ok(applications)
    }

    async fn transact<T, F>(&self, opportunity_id: OpportunityId, op: F) -> Result<T, MatchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Transaction) -> Result<T, MatchError> + Send + 'static,
    {
        self.transact_sync(opportunity_id, op)
    }

    async fn events_after(&self, after: u64, limit: usize) -> Result<Vec<DomainEvent>, MatchError> {
        self.ensure_online()?;
        let outbox = self.outbox.lock();
        // Sequences are dense and start at 1, so `after` is also the index of the
        // first event to return.
        let start = usize::try_from(after).unwrap_or(usize::MAX);
        Ok(outbox
            .events
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, MatchError> {
        self.ensure_online()?;
        Ok(self.organizations.read().get(&id).cloned())
    }
}
