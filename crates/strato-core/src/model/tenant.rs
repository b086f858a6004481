// ── Tenant ──

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::id::{PrincipalId, TenantId};

/// Cloudflare credentials owned by a tenant.
///
/// The key is held as a `SecretString` so it never leaks through
/// `Debug` output or logs. Deliberately not serializable.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub email: String,
    pub api_key: SecretString,
}

impl ProviderCredentials {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }
}

/// A customer account owning domains and provider credentials.
///
/// Invariant: exactly one owner; the manager set never contains the
/// owner (enforced on construction and on manager mutation).
#[derive(Debug, Clone)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub owner: PrincipalId,
    pub managers: BTreeSet<PrincipalId>,
    pub credentials: ProviderCredentials,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, owner: PrincipalId, credentials: ProviderCredentials) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            owner,
            managers: BTreeSet::new(),
            credentials,
            created_at: Utc::now(),
        }
    }

    /// Add a manager. The owner is never duplicated into the manager set.
    pub fn add_manager(&mut self, principal: PrincipalId) -> bool {
        if principal == self.owner {
            return false;
        }
        self.managers.insert(principal)
    }

    pub fn remove_manager(&mut self, principal: &PrincipalId) -> bool {
        self.managers.remove(principal)
    }

    pub fn is_manager(&self, principal: &PrincipalId) -> bool {
        self.managers.contains(principal)
    }
}
