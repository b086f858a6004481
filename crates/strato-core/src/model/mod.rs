// Domain model for the dashboard core.
//
// Ownership chain: Tenant -> Domain -> DnsRecord (cascading delete).
// UserDomainPermission references but never owns its targets.

mod domain;
mod id;
mod permission;
mod principal;
mod record;
mod tenant;

pub use domain::{Domain, DomainChange};
pub use id::{DomainId, PermissionId, PrincipalId, RecordId, TenantId};
pub use permission::{PermissionGrant, UserDomainPermission};
pub use principal::{Principal, Role};
pub use record::{DnsRecord, RecordChange, RecordDraft, RecordType};
pub use tenant::{ProviderCredentials, Tenant};
