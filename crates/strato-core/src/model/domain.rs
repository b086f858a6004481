// ── Domain ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DomainId, TenantId};

/// A domain mirrored from a remote zone.
///
/// `status` echoes the remote zone's lifecycle status verbatim;
/// `zone_id` is the remote identifier, absent for domains created by
/// hand before their first sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    pub tenant_id: TenantId,
    /// Unique within the owning tenant.
    pub name: String,
    pub proxied: bool,
    pub status: String,
    pub zone_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Domain {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: DomainId::new(),
            tenant_id,
            name: name.into(),
            proxied: true,
            status: "active".to_owned(),
            zone_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial update to a domain.
///
/// Field presence matters to the permission gate: restricted
/// principals may only touch `name` and `proxied`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainChange {
    pub name: Option<String>,
    pub proxied: Option<bool>,
    pub status: Option<String>,
    pub zone_id: Option<String>,
}

impl DomainChange {
    /// Names of the fields this change touches, for gate diagnostics.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.proxied.is_some() {
            fields.push("proxied");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.zone_id.is_some() {
            fields.push("zone_id");
        }
        fields
    }

    /// `true` if every touched field is in the restricted allow-list.
    pub fn only_touches_allowed(&self) -> bool {
        self.status.is_none() && self.zone_id.is_none()
    }

    /// Apply the change to a domain, returning `true` if anything
    /// actually differed.
    pub fn apply_to(&self, domain: &mut Domain) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name
            && *name != domain.name
        {
            domain.name = name.clone();
            changed = true;
        }
        if let Some(proxied) = self.proxied
            && proxied != domain.proxied
        {
            domain.proxied = proxied;
            changed = true;
        }
        if let Some(status) = &self.status
            && *status != domain.status
        {
            domain.status = status.clone();
            changed = true;
        }
        if let Some(zone_id) = &self.zone_id
            && Some(zone_id.as_str()) != domain.zone_id.as_deref()
        {
            domain.zone_id = Some(zone_id.clone());
            changed = true;
        }
        changed
    }
}
