//! Opaque identifiers for engine entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifier of an authenticated user (volunteer or organization staff).
    UserId
);
define_id!(
    /// Identifier of an organization.
    OrganizationId
);
define_id!(
    /// Identifier of an opportunity.
    OpportunityId
);
define_id!(
    /// Identifier of an application.
    ApplicationId
);
define_id!(
    /// Identifier of a notification record.
    NotificationId
);
define_id!(
    /// Identifier of a committed domain event.
    EventId
);
