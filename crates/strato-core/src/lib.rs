//! Domain core of the strato DNS dashboard: local mirror, Cloudflare
//! reconciliation, and the permission model layered over both.
//!
//! This crate owns the business logic between `strato-api` and whatever
//! surface embeds it (HTTP layer, admin CLI):
//!
//! - **[`Dashboard`]** — Central facade. Every operation runs
//!   gate → provider → mirror: the permission gate is consulted first,
//!   write-through mutations hit Cloudflare before the mirror, and
//!   reads opportunistically refresh the mirror with a stale fallback.
//!
//! - **[`MirrorStore`]** — Lock-free in-process mirror of tenants,
//!   domains, records, and visibility permissions (`DashMap` +
//!   `ArcSwap` snapshots). Cascading deletes and reference nulling keep
//!   the rows relationally consistent.
//!
//! - **[`reconcile`]** — Pure snapshot application: zone sync treats
//!   the provider as authoritative for domains, record sync soft-caches
//!   and never deletes.
//!
//! - **[`authorize`]** — The single policy entry point: admin bypass,
//!   managed-tenant scoping, and the CNAME-only rules for restricted
//!   principals.
//!
//! - **[`visibility`]** — Read-time narrowing of a domain's record set
//!   to the CNAMEs pointing at a principal's approved A/AAAA target.

pub mod authz;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod visibility;

// ── Primary re-exports ──────────────────────────────────────────────
pub use authz::{Action, Decision, authorize};
pub use error::CoreError;
pub use reconcile::{RecordSyncSummary, ZoneSyncSummary};
pub use service::{Dashboard, DashboardStats};
pub use store::{MirrorStore, Upsert};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DnsRecord,
    Domain,
    DomainChange,
    DomainId,
    PermissionGrant,
    PermissionId,
    Principal,
    PrincipalId,
    ProviderCredentials,
    RecordChange,
    RecordDraft,
    RecordId,
    RecordType,
    Role,
    Tenant,
    TenantId,
    UserDomainPermission,
};
