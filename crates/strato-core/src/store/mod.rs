// ── Local mirror store ──
//
// In-process relational mirror of tenants, domains, records, and
// visibility permissions. Exposes exactly the operations the
// reconciliation engine and the permission gate need: point lookups,
// filtered scans, upsert-by-remote-id, cascading deletes, and
// permission-reference nulling.

mod table;

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::model::{
    DnsRecord, Domain, DomainId, PermissionId, PrincipalId, RecordId, RecordType, Tenant,
    TenantId, UserDomainPermission,
};
use table::Table;

/// Outcome of an atomic keyed upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    Unchanged,
}

/// The local mirror of remote zone/record state plus the permission
/// rows layered on top of it.
///
/// Thread-safe; every method takes `&self`. Row mutations are atomic
/// and overlapping syncs resolve last-write-wins; there is no
/// cross-row transaction. The sync join keys -- (tenant, domain name)
/// and (domain, remote record id) -- are backed by unique indexes, so
/// concurrent upserts on the same key serialize instead of inserting
/// duplicate rows.
pub struct MirrorStore {
    tenants: Table<TenantId, Tenant>,
    domains: Table<DomainId, Domain>,
    records: Table<RecordId, DnsRecord>,
    permissions: Table<PermissionId, UserDomainPermission>,
    domain_names: DashMap<(TenantId, String), DomainId>,
    record_remote_ids: DashMap<(DomainId, String), RecordId>,
}

impl Default for MirrorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorStore {
    pub fn new() -> Self {
        Self {
            tenants: Table::new(),
            domains: Table::new(),
            records: Table::new(),
            permissions: Table::new(),
            domain_names: DashMap::new(),
            record_remote_ids: DashMap::new(),
        }
    }

    // ── Tenants ──────────────────────────────────────────────────────

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.tenants.upsert(tenant.id, tenant);
    }

    pub fn tenant(&self, id: &TenantId) -> Option<Arc<Tenant>> {
        self.tenants.get(id)
    }

    pub fn tenants(&self) -> Vec<Arc<Tenant>> {
        self.tenants.snapshot().to_vec()
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    /// Delete a tenant and cascade its domains (and their records and
    /// permissions).
    pub fn delete_tenant(&self, id: &TenantId) -> Option<Arc<Tenant>> {
        for domain_id in self
            .domains
            .keys_where(|_, domain| domain.tenant_id == *id)
        {
            self.delete_domain(&domain_id);
        }
        self.tenants.remove(id)
    }

    // ── Domains ──────────────────────────────────────────────────────

    pub fn insert_domain(&self, domain: Domain) {
        if let Some(previous) = self.domains.get(&domain.id)
            && previous.name != domain.name
        {
            self.domain_names
                .remove(&(previous.tenant_id, previous.name.clone()));
        }
        self.domain_names
            .insert((domain.tenant_id, domain.name.clone()), domain.id);
        self.domains.upsert(domain.id, domain);
    }

    /// Atomic upsert keyed on (tenant, name) -- the zone-sync join key.
    ///
    /// `insert` builds the row when the key is new; `refresh` maps the
    /// existing row to its replacement, or `None` to leave it alone.
    /// Concurrent callers on the same key serialize on the index entry,
    /// so a name never maps to two rows.
    pub fn upsert_domain_by_name(
        &self,
        tenant_id: TenantId,
        name: &str,
        insert: impl FnOnce() -> Domain,
        refresh: impl FnOnce(&Domain) -> Option<Domain>,
    ) -> Upsert {
        match self.domain_names.entry((tenant_id, name.to_owned())) {
            Entry::Vacant(slot) => {
                let domain = insert();
                let id = domain.id;
                self.domains.upsert(id, domain);
                slot.insert(id);
                Upsert::Created
            }
            Entry::Occupied(mut slot) => match self.domains.get(slot.get()) {
                Some(existing) => match refresh(&existing) {
                    Some(updated) => {
                        self.domains.upsert(*slot.get(), updated);
                        Upsert::Updated
                    }
                    None => Upsert::Unchanged,
                },
                // Index entry outlived its row; reinsert under the key.
                None => {
                    let domain = insert();
                    let id = domain.id;
                    self.domains.upsert(id, domain);
                    slot.insert(id);
                    Upsert::Created
                }
            },
        }
    }

    pub fn domain(&self, id: &DomainId) -> Option<Arc<Domain>> {
        self.domains.get(id)
    }

    pub fn domains(&self) -> Vec<Arc<Domain>> {
        self.domains.snapshot().to_vec()
    }

    pub fn domains_for_tenant(&self, tenant_id: &TenantId) -> Vec<Arc<Domain>> {
        self.domains
            .filter(|domain| domain.tenant_id == *tenant_id)
    }

    /// Lookup by (tenant, name) -- the zone-sync join key.
    pub fn domain_by_name(&self, tenant_id: &TenantId, name: &str) -> Option<Arc<Domain>> {
        let id = self
            .domain_names
            .get(&(*tenant_id, name.to_owned()))
            .map(|entry| *entry.value())?;
        self.domains.get(&id)
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Delete a domain, cascading its records and its permission rows.
    pub fn delete_domain(&self, id: &DomainId) -> Option<Arc<Domain>> {
        for record_id in self
            .records
            .keys_where(|_, record| record.domain_id == *id)
        {
            self.remove_record_row(&record_id);
        }
        for permission_id in self
            .permissions
            .keys_where(|_, permission| permission.domain_id == *id)
        {
            self.permissions.remove(&permission_id);
        }
        let removed = self.domains.remove(id);
        if let Some(domain) = &removed {
            self.domain_names
                .remove(&(domain.tenant_id, domain.name.clone()));
            debug!(domain_id = %id, "deleted domain and cascaded records/permissions");
        }
        removed
    }

    // ── Records ──────────────────────────────────────────────────────

    pub fn insert_record(&self, record: DnsRecord) {
        if let Some(remote_id) = &record.remote_id {
            self.record_remote_ids
                .insert((record.domain_id, remote_id.clone()), record.id);
        }
        self.records.upsert(record.id, record);
    }

    /// Atomic upsert keyed on (domain, remote record id) -- the
    /// record-sync join key. Same contract as
    /// [`MirrorStore::upsert_domain_by_name`].
    pub fn upsert_record_by_remote_id(
        &self,
        domain_id: DomainId,
        remote_id: &str,
        insert: impl FnOnce() -> DnsRecord,
        refresh: impl FnOnce(&DnsRecord) -> Option<DnsRecord>,
    ) -> Upsert {
        match self.record_remote_ids.entry((domain_id, remote_id.to_owned())) {
            Entry::Vacant(slot) => {
                let record = insert();
                let id = record.id;
                self.records.upsert(id, record);
                slot.insert(id);
                Upsert::Created
            }
            Entry::Occupied(mut slot) => match self.records.get(slot.get()) {
                Some(existing) => match refresh(&existing) {
                    Some(updated) => {
                        self.records.upsert(*slot.get(), updated);
                        Upsert::Updated
                    }
                    None => Upsert::Unchanged,
                },
                None => {
                    let record = insert();
                    let id = record.id;
                    self.records.upsert(id, record);
                    slot.insert(id);
                    Upsert::Created
                }
            },
        }
    }

    pub fn record(&self, id: &RecordId) -> Option<Arc<DnsRecord>> {
        self.records.get(id)
    }

    pub fn records_for_domain(&self, domain_id: &DomainId) -> Vec<Arc<DnsRecord>> {
        self.records
            .filter(|record| record.domain_id == *domain_id)
    }

    pub fn records_of_type(
        &self,
        domain_id: &DomainId,
        record_type: RecordType,
    ) -> Vec<Arc<DnsRecord>> {
        self.records.filter(|record| {
            record.domain_id == *domain_id && record.record_type == record_type
        })
    }

    /// Newest-first CNAME records visible across a set of tenants
    /// (dashboard "recent subdomains" panel).
    pub fn recent_cnames(&self, tenants: Option<&[TenantId]>, limit: usize) -> Vec<Arc<DnsRecord>> {
        let mut cnames: Vec<Arc<DnsRecord>> = self
            .records
            .filter(|record| record.record_type == RecordType::Cname)
            .into_iter()
            .filter(|record| match tenants {
                Some(ids) => self
                    .domain(&record.domain_id)
                    .is_some_and(|domain| ids.contains(&domain.tenant_id)),
                None => true,
            })
            .collect();
        cnames.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        cnames.truncate(limit);
        cnames
    }

    /// Lookup by the reconciliation key (domain, remote record id).
    pub fn record_by_remote_id(
        &self,
        domain_id: &DomainId,
        remote_id: &str,
    ) -> Option<Arc<DnsRecord>> {
        let id = self
            .record_remote_ids
            .get(&(*domain_id, remote_id.to_owned()))
            .map(|entry| *entry.value())?;
        self.records.get(&id)
    }

    /// `true` if the domain hosts at least one CNAME record (gate
    /// precondition for restricted domain updates).
    pub fn domain_has_cname(&self, domain_id: &DomainId) -> bool {
        self.records
            .find(|record| {
                record.domain_id == *domain_id && record.record_type == RecordType::Cname
            })
            .is_some()
    }

    /// Delete a record and null any permission rows referencing it.
    pub fn delete_record(&self, id: &RecordId) -> Option<Arc<DnsRecord>> {
        let removed = self.remove_record_row(id);
        if removed.is_some() {
            for permission_id in self
                .permissions
                .keys_where(|_, permission| permission.allowed_record_id == Some(*id))
            {
                if let Some(permission) = self.permissions.get(&permission_id) {
                    let mut nulled = (*permission).clone();
                    nulled.allowed_record_id = None;
                    self.permissions.upsert(permission_id, nulled);
                }
            }
        }
        removed
    }

    /// Remove a record row together with its remote-id index entry.
    fn remove_record_row(&self, id: &RecordId) -> Option<Arc<DnsRecord>> {
        let removed = self.records.remove(id);
        if let Some(record) = &removed
            && let Some(remote_id) = &record.remote_id
        {
            self.record_remote_ids
                .remove(&(record.domain_id, remote_id.clone()));
        }
        removed
    }

    // ── Permissions ──────────────────────────────────────────────────

    /// Insert a permission row, keeping at most one row per
    /// (principal, domain, record) triple.
    pub fn insert_permission(&self, permission: UserDomainPermission) {
        let duplicate = self.permissions.find(|existing| {
            existing.principal_id == permission.principal_id
                && existing.domain_id == permission.domain_id
                && existing.allowed_record_id == permission.allowed_record_id
        });
        if duplicate.is_none() {
            self.permissions.upsert(permission.id, permission);
        }
    }

    /// The permission row for (principal, domain), if any.
    pub fn permission_for(
        &self,
        principal_id: &PrincipalId,
        domain_id: &DomainId,
    ) -> Option<Arc<UserDomainPermission>> {
        self.permissions.find(|permission| {
            permission.principal_id == *principal_id && permission.domain_id == *domain_id
        })
    }

    pub fn permissions_for_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Vec<Arc<UserDomainPermission>> {
        self.permissions
            .filter(|permission| permission.principal_id == *principal_id)
    }

    pub fn delete_permission(&self, id: &PermissionId) -> Option<Arc<UserDomainPermission>> {
        self.permissions.remove(id)
    }
}
