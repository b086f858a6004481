// ── Visibility permissions ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DomainId, PermissionId, PrincipalId, RecordId, TenantId};

/// Grants a restricted principal visibility into one domain, scoped to
/// the CNAMEs pointing at one approved A/AAAA record.
///
/// Invariants: the referenced record, when set, is an A/AAAA record
/// belonging to `domain_id`; at most one row exists per
/// (principal, domain, record) triple. Deleting the referenced record
/// nulls `allowed_record_id` -- the permission row survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDomainPermission {
    pub id: PermissionId,
    pub principal_id: PrincipalId,
    pub domain_id: DomainId,
    /// The approved A/AAAA target. `None` means the permission grants
    /// nothing yet.
    pub allowed_record_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

impl UserDomainPermission {
    pub fn new(
        principal_id: PrincipalId,
        domain_id: DomainId,
        allowed_record_id: Option<RecordId>,
    ) -> Self {
        Self {
            id: PermissionId::new(),
            principal_id,
            domain_id,
            allowed_record_id,
            created_at: Utc::now(),
        }
    }
}

/// One requested permission entry, as submitted by an admin.
///
/// Each grant is validated against live tenant/domain/record rows
/// before persistence; invalid entries are dropped with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub tenant_id: TenantId,
    pub domain_id: DomainId,
    pub record_id: RecordId,
}
