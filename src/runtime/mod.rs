//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{
    decide, health, mark_read, submit_application, withdraw, ApplicationResponse, DecideRequest,
    ErrorBody, Health, MarkReadRequest, MarkReadResponse, SubmitApplicationRequest,
    WithdrawRequest,
};
pub use tokio_spawner::TokioSpawner;
