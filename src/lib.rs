//! # Volunteer Match
//!
//! Application lifecycle and capacity-constrained matching engine for a volunteer
//! marketplace, with a realtime notification fan-out.
//!
//! A volunteer's interest in an opportunity becomes a tracked application; an
//! organization's accept/reject decision consumes one of the opportunity's limited
//! slots; both parties are notified of every change without polling.
//!
//! ## Guarantees
//!
//! - **No overbooking**: the capacity check and increment on approval run in one
//!   transaction scoped to the opportunity row. Two concurrent approvals for the
//!   last slot yield exactly one success and one `OpportunityFull`.
//! - **One application per pair**: the store enforces a unique index on
//!   (volunteer, opportunity) at insert time.
//! - **One current status**: `pending → approved | rejected`, `approved → withdrawn`.
//!   Any other edge fails.
//! - **Exactly-once notifications**: events are written to an outbox in the same
//!   commit, relayed at-least-once, and deduplicated per (event, recipient).
//!
//! ## Components
//!
//! ```text
//!  actor ─▶ TransitionAuthority ─▶ ApplicationStore (rows + ledger + outbox, one commit)
//!                                          │
//!                                          ▼
//!                                     EventRelay ─▶ NotificationFanout ─▶ Subscription
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use volunteer_match::core::{Actor, Decision, Engine, EngineOptions};
//! use volunteer_match::infra::{InMemoryNotificationStore, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = Engine::new(store, Arc::new(InMemoryNotificationStore::new()), EngineOptions::default());
//!
//! let app = engine.submit_application(&volunteer, opportunity.id, None).await?;
//! engine.decide(app.id, Decision::Approve, &staff).await?;
//! let mut inbox = engine.subscribe(volunteer.user_id).await?;
//! ```
//!
//! For complete scenarios, see `tests/lifecycle_test.rs` and `tests/concurrency_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Application lifecycle, capacity ledger, events, fan-out, and projections.
pub mod core;
/// Configuration models for the engine and its backends.
pub mod config;
/// Builders to construct the engine from configuration.
pub mod builders;
/// Infrastructure adapters for application and notification storage.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
