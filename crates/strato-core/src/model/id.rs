// ── Typed entity identifiers ──
//
// One newtype per entity keeps foreign keys from being swapped by
// accident -- a DomainId never unifies with a RecordId.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Tenant`](super::Tenant).
    TenantId
);
entity_id!(
    /// Identifier of a [`Domain`](super::Domain).
    DomainId
);
entity_id!(
    /// Identifier of a [`DnsRecord`](super::DnsRecord).
    RecordId
);
entity_id!(
    /// Identifier of a [`Principal`](super::Principal).
    PrincipalId
);
entity_id!(
    /// Identifier of a [`UserDomainPermission`](super::UserDomainPermission).
    PermissionId
);
