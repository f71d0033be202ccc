//! Read-only dashboard projections.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::MatchError;
use super::model::{Actor, Application, ApplicationStatus, Opportunity, OpportunityStatus, Role};
use super::store::ApplicationStore;
use crate::util::ids::{OpportunityId, OrganizationId, UserId};

/// Application counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Pending applications.
    pub pending: usize,
    /// Approved applications.
    pub approved: usize,
    /// Rejected applications.
    pub rejected: usize,
    /// Withdrawn applications.
    pub withdrawn: usize,
}

impl StatusCounts {
    /// Count applications by status.
    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a Application>) -> Self {
        let mut counts = Self::default();
        for application in applications {
            counts.add(application.status);
        }
        counts
    }

    fn add(&mut self, status: ApplicationStatus) {
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Approved => self.approved += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
            ApplicationStatus::Withdrawn => self.withdrawn += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.pending += other.pending;
        self.approved += other.approved;
        self.rejected += other.rejected;
        self.withdrawn += other.withdrawn;
    }

    /// Total applications counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.withdrawn
    }
}

/// An opportunity together with its applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// The opportunity.
    pub opportunity: Opportunity,
    /// Applications, oldest first.
    pub applications: Vec<Application>,
    /// Counts by status.
    pub counts: StatusCounts,
}

/// One row of a volunteer's application history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The application.
    pub application: Application,
    /// Title of the opportunity applied to.
    pub opportunity_title: String,
    /// Current status of that opportunity.
    pub opportunity_status: OpportunityStatus,
}

/// Summary numbers on a volunteer dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerStats {
    /// All applications.
    pub total: usize,
    /// Counts by status.
    pub by_status: StatusCounts,
    /// Approved applications on opportunities that have since closed.
    pub completed: usize,
}

/// Dashboard shaped by the capability of the actor viewing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    /// Organization staff: rosters of every owned opportunity.
    OrganizationView {
        /// Organization shown.
        organization_id: OrganizationId,
        /// One roster per opportunity, newest opportunity first.
        rosters: Vec<Roster>,
        /// Counts across all rosters.
        totals: StatusCounts,
    },
    /// Volunteer: own application history.
    VolunteerView {
        /// Volunteer shown.
        volunteer_id: UserId,
        /// Applications, newest first.
        history: Vec<HistoryEntry>,
        /// Summary numbers.
        stats: VolunteerStats,
    },
}

/// Filter for browsing active opportunities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityFilter {
    /// Case-insensitive match on title or description.
    pub search_term: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Exact category; `"all"` matches every category.
    pub category: Option<String>,
}

impl OpportunityFilter {
    /// Whether `opportunity` passes the filter.
    #[must_use]
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
            if !contains(&opportunity.title, term) && !contains(&opportunity.description, term) {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            if !contains(&opportunity.location, location) {
                return false;
            }
        }
        match self.category.as_deref() {
            None | Some("all" | "") => true,
            Some(category) => opportunity.category == category,
        }
    }
}

/// Builds read projections from the application store.
pub struct DashboardProjector<S> {
    store: Arc<S>,
}

impl<S: ApplicationStore> DashboardProjector<S> {
    /// Create a projector over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Applications of one opportunity with counts.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown opportunity; store failures.
    pub async fn roster(&self, opportunity_id: OpportunityId) -> Result<Roster, MatchError> {
        let opportunity = self
            .store
            .opportunity(opportunity_id)
            .await?
            .ok_or_else(|| MatchError::not_found("opportunity", opportunity_id))?;
        let applications = self.store.applications_for_opportunity(opportunity_id).await?;
        let counts = StatusCounts::tally(&applications);
        Ok(Roster {
            opportunity,
            applications,
            counts,
        })
    }

    /// A volunteer's applications, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn history(&self, volunteer_id: UserId) -> Result<Vec<HistoryEntry>, MatchError> {
        let applications = self.store.applications_for_volunteer(volunteer_id).await?;
        let mut history = Vec::with_capacity(applications.len());
        for application in applications {
            let Some(opportunity) = self.store.opportunity(application.opportunity_id).await? else {
                continue;
            };
            history.push(HistoryEntry {
                application,
                opportunity_title: opportunity.title,
                opportunity_status: opportunity.status,
            });
        }
        Ok(history)
    }

    /// Dashboard for the authenticated actor.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn dashboard(&self, actor: &Actor) -> Result<DashboardView, MatchError> {
        match actor.role {
            Role::OrganizationStaff { organization_id } => {
                let opportunities = self
                    .store
                    .opportunities_for_organization(organization_id)
                    .await?;
                let mut rosters = Vec::with_capacity(opportunities.len());
                let mut totals = StatusCounts::default();
                for opportunity in opportunities {
                    let applications = self
                        .store
                        .applications_for_opportunity(opportunity.id)
                        .await?;
                    let counts = StatusCounts::tally(&applications);
                    totals.merge(counts);
                    rosters.push(Roster {
                        opportunity,
                        applications,
                        counts,
                    });
                }
                Ok(DashboardView::OrganizationView {
                    organization_id,
                    rosters,
                    totals,
                })
            }
            Role::Volunteer => {
                let history = self.history(actor.user_id).await?;
                let by_status = StatusCounts::tally(history.iter().map(|h| &h.application));
                let completed = history
                    .iter()
                    .filter(|h| {
                        h.application.status == ApplicationStatus::Approved
                            && h.opportunity_status == OpportunityStatus::Closed
                    })
                    .count();
                Ok(DashboardView::VolunteerView {
                    volunteer_id: actor.user_id,
                    stats: VolunteerStats {
                        total: history.len(),
                        by_status,
                        completed,
                    },
                    history,
                })
            }
        }
    }

    /// Active opportunities matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn browse(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, MatchError> {
        let mut found: Vec<Opportunity> = self
            .store
            .active_opportunities()
            .await?
            .into_iter()
            .filter(|opp| filter.matches(opp))
            .collect();
        found.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(found)
    }
}
