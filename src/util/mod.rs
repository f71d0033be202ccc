//! Shared utilities.

pub mod clock;
pub mod ids;
pub mod retry;
pub mod telemetry;

pub use clock::*;
pub use ids::*;
pub use retry::*;
pub use telemetry::*;
