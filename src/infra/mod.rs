//! Infrastructure adapters for application and notification storage.

pub mod mailbox;
pub mod store;

pub use mailbox::{FileNotificationStore, InMemoryNotificationStore, NotificationBackend};
pub use store::MemoryStore;
