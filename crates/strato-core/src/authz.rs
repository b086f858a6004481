// ── Permission/role gate ──
//
// One entry point, `authorize`, consulted before every operation:
// CNAME-only mutations for restricted principals, the three-label
// subdomain rule, the domain field allow-list, managed-tenant scoping,
// and admin-only tenant administration. Checks never mutate state.

use crate::error::CoreError;
use crate::model::{
    DnsRecord, Domain, DomainChange, Principal, RecordChange, RecordDraft, RecordType, Role,
    Tenant,
};

/// An operation awaiting authorization, carrying the context the rules
/// need. Everything is borrowed -- building an `Action` is free.
#[derive(Debug)]
pub enum Action<'a> {
    /// Read one tenant's details.
    ReadTenant { tenant: &'a Tenant },
    /// Create, update, or delete tenants; manage visibility grants.
    AdministerTenants,
    /// Trigger a tenant-wide zone sync.
    SyncZones { tenant: &'a Tenant },
    /// Read a domain and its records.
    ReadDomain { domain: &'a Domain },
    /// Create a domain by hand (zone sync is the usual path).
    CreateDomain,
    /// Apply a partial update to a domain.
    UpdateDomain {
        domain: &'a Domain,
        change: &'a DomainChange,
        domain_has_cname: bool,
    },
    /// Delete a domain and everything under it.
    DeleteDomain {
        domain: &'a Domain,
        domain_has_cname: bool,
    },
    /// Create a record in a domain.
    CreateRecord {
        domain: &'a Domain,
        draft: &'a RecordDraft,
    },
    /// Update an existing record.
    UpdateRecord {
        domain: &'a Domain,
        record: &'a DnsRecord,
        change: &'a RecordChange,
    },
    /// Delete an existing record.
    DeleteRecord {
        domain: &'a Domain,
        record: &'a DnsRecord,
    },
}

/// Authorization decision. A denial carries the violated rule verbatim
/// so callers can surface it without re-deriving context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { rule: String },
}

impl Decision {
    fn deny(rule: impl Into<String>) -> Self {
        Self::Deny { rule: rule.into() }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a `Result`, mapping a denial to
    /// [`CoreError::PermissionDenied`].
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { rule } => Err(CoreError::PermissionDenied { rule }),
        }
    }
}

/// Evaluate the policy for `principal` performing `action`.
///
/// Admins are unrestricted. Restricted principals are scoped to their
/// managed tenants and to CNAME management within them.
pub fn authorize(principal: &Principal, action: &Action<'_>) -> Decision {
    if principal.role == Role::Admin {
        return Decision::Allow;
    }

    match action {
        Action::ReadTenant { tenant } | Action::SyncZones { tenant } => {
            // The manager relation is recorded on both sides; either
            // suffices.
            if principal.manages(&tenant.id) || tenant.is_manager(&principal.id) {
                Decision::Allow
            } else {
                Decision::deny("only managers of a tenant may access it")
            }
        }

        Action::AdministerTenants => {
            Decision::deny("only administrators may manage tenants and permissions")
        }

        Action::CreateDomain => Decision::deny("only administrators may create domains directly"),

        Action::ReadDomain { domain } => scoped_to_tenant(principal, domain),

        Action::UpdateDomain {
            domain,
            change,
            domain_has_cname,
        } => {
            if let deny @ Decision::Deny { .. } = scoped_to_tenant(principal, domain) {
                return deny;
            }
            if !domain_has_cname {
                return Decision::deny(
                    "regular users may only edit domains hosting CNAME records",
                );
            }
            if !change.only_touches_allowed() {
                return Decision::deny(format!(
                    "regular users may only edit the name and proxied fields (got: {})",
                    change.touched_fields().join(", ")
                ));
            }
            Decision::Allow
        }

        Action::DeleteDomain {
            domain,
            domain_has_cname,
        } => {
            if let deny @ Decision::Deny { .. } = scoped_to_tenant(principal, domain) {
                return deny;
            }
            if !domain_has_cname {
                return Decision::deny(
                    "regular users may only delete domains hosting CNAME records",
                );
            }
            Decision::Allow
        }

        Action::CreateRecord { domain, draft } => {
            if let deny @ Decision::Deny { .. } = scoped_to_tenant(principal, domain) {
                return deny;
            }
            if draft.record_type != RecordType::Cname {
                return Decision::deny("regular users may only create CNAME records");
            }
            if !is_subdomain_name(&draft.name) {
                return Decision::deny(
                    "regular users may only create subdomains (e.g. sub.domain.com)",
                );
            }
            if draft.content.trim().is_empty() {
                return Decision::deny("CNAME records require a target in content");
            }
            Decision::Allow
        }

        Action::UpdateRecord {
            domain,
            record,
            change,
        } => {
            if let deny @ Decision::Deny { .. } = scoped_to_tenant(principal, domain) {
                return deny;
            }
            if record.record_type != RecordType::Cname {
                return Decision::deny("regular users may only edit CNAME records");
            }
            // Changing the type away from CNAME is rejected too.
            if change.type_after(record) != RecordType::Cname {
                return Decision::deny("regular users may not change a record's type");
            }
            if let Some(name) = &change.name
                && !is_subdomain_name(name)
            {
                return Decision::deny(
                    "regular users may only create subdomains (e.g. sub.domain.com)",
                );
            }
            Decision::Allow
        }

        Action::DeleteRecord { domain, record } => {
            if let deny @ Decision::Deny { .. } = scoped_to_tenant(principal, domain) {
                return deny;
            }
            if record.record_type != RecordType::Cname {
                return Decision::deny("regular users may only delete CNAME records");
            }
            Decision::Allow
        }
    }
}

fn scoped_to_tenant(principal: &Principal, domain: &Domain) -> Decision {
    if principal.manages(&domain.tenant_id) {
        Decision::Allow
    } else {
        Decision::deny("domain belongs to a tenant outside your managed set")
    }
}

/// A genuine subdomain has at least two embedded dots
/// (`sub.domain.com`), never a bare second-level name.
fn is_subdomain_name(name: &str) -> bool {
    name.trim_end_matches('.').matches('.').count() >= 2
}
