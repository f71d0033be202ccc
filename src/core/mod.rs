//! Application lifecycle, capacity accounting, and notification fan-out.

pub mod authority;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod event;
pub mod fanout;
pub mod ledger;
pub mod model;
pub mod projector;
pub mod store;

pub use authority::{RepeatPolicy, Transition, TransitionAuthority};
pub use emitter::{EventRelay, Spawn};
pub use engine::{Engine, EngineOptions, RelayMode};
pub use error::{AppResult, MatchError};
pub use event::{DomainEvent, EventKind};
pub use fanout::{FanoutReport, NotificationFanout, Subscription};
pub use ledger::Reservation;
pub use model::{
    Actor, Application, ApplicationStatus, Decision, NewOpportunity, Notification, Opportunity,
    OpportunityStatus, Organization, Role,
};
pub use projector::{
    DashboardProjector, DashboardView, HistoryEntry, OpportunityFilter, Roster, StatusCounts,
    VolunteerStats,
};
pub use store::{ApplicationStore, Directory, MarkRead, NotificationStore, Transaction};
