// ── Principal & role ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::id::{PrincipalId, TenantId};

/// The two roles the dashboard distinguishes.
///
/// A closed enum rather than a role string: every authorization
/// decision goes through [`authorize`](crate::authz::authorize), so a
/// typo'd role can't silently grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// An authenticated actor.
///
/// Authentication itself is out of scope; the embedding layer hands
/// the core a resolved `Principal` per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: Role,
    /// Tenants this principal manages. Ignored for admins, who see
    /// everything.
    pub managed_tenants: BTreeSet<TenantId>,
}

impl Principal {
    pub fn admin() -> Self {
        Self {
            id: PrincipalId::new(),
            role: Role::Admin,
            managed_tenants: BTreeSet::new(),
        }
    }

    pub fn user(managed_tenants: impl IntoIterator<Item = TenantId>) -> Self {
        Self {
            id: PrincipalId::new(),
            role: Role::User,
            managed_tenants: managed_tenants.into_iter().collect(),
        }
    }

    pub fn manages(&self, tenant: &TenantId) -> bool {
        self.managed_tenants.contains(tenant)
    }
}
