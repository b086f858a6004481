// ── Dashboard service facade ──
//
// The entry point the (out-of-scope) HTTP layer calls into. Every
// operation runs gate -> provider -> mirror in that order: permission
// and validation failures abort before any remote call, and the mirror
// is only mutated after the provider accepted a write-through change.
//
// Provider errors are never retried here. Two paths are best-effort:
// the opportunistic refresh before a read and the discovery sync after
// tenant creation both log and fall back to the local mirror instead
// of failing the operation.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use strato_api::models::Credentials;
use strato_api::transport::TransportConfig;
use strato_api::{CloudflareClient, RecordPayload};

use crate::authz::{Action, authorize};
use crate::error::CoreError;
use crate::model::{
    DnsRecord, Domain, DomainChange, DomainId, PermissionGrant, Principal, PrincipalId,
    ProviderCredentials, RecordChange, RecordDraft, RecordId, RecordType, Tenant, TenantId,
    UserDomainPermission,
};
use crate::reconcile::{ZoneSyncSummary, apply_record_snapshot, apply_zone_snapshot};
use crate::store::MirrorStore;
use crate::visibility::compute_visible;

/// Counters for the dashboard landing page, scoped to what the
/// principal may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub tenants: usize,
    pub domains: usize,
    pub records: usize,
}

/// The dashboard core: local mirror plus per-tenant provider clients.
///
/// Cheaply cloneable; one instance serves all requests. There is no
/// cross-request locking -- overlapping syncs race benignly because
/// every mirror upsert is idempotent and last-write-wins.
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<MirrorStore>,
    transport: TransportConfig,
    api_base: Url,
}

impl Dashboard {
    /// Create a dashboard against the production Cloudflare endpoint.
    pub fn new(store: Arc<MirrorStore>, transport: TransportConfig) -> Result<Self, CoreError> {
        let api_base = strato_api::client::DEFAULT_API_BASE
            .parse()
            .map_err(|e: url::ParseError| CoreError::ProviderUnexpected {
                message: e.to_string(),
            })?;
        Ok(Self::with_api_base(store, transport, api_base))
    }

    /// Create a dashboard against a custom provider endpoint
    /// (test servers, proxies).
    pub fn with_api_base(
        store: Arc<MirrorStore>,
        transport: TransportConfig,
        api_base: Url,
    ) -> Self {
        Self {
            store,
            transport,
            api_base,
        }
    }

    /// The local mirror, for read-only embedding (report pages, etc.).
    pub fn store(&self) -> &Arc<MirrorStore> {
        &self.store
    }

    // ── Tenants ──────────────────────────────────────────────────────

    /// Create a tenant and opportunistically discover its zones and
    /// records. Discovery failure is logged and swallowed; the tenant
    /// is created either way.
    pub async fn create_tenant(
        &self,
        principal: &Principal,
        name: &str,
        owner: PrincipalId,
        credentials: ProviderCredentials,
    ) -> Result<Arc<Tenant>, CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        if name.trim().is_empty() {
            return Err(CoreError::validation("tenant name must not be empty"));
        }

        let tenant = Tenant::new(name, owner, credentials);
        let tenant_id = tenant.id;
        self.store.insert_tenant(tenant);
        info!(tenant = name, "tenant created");

        if let Err(e) = self.discover_tenant(tenant_id).await {
            warn!(tenant = name, error = %e, "initial zone discovery failed; continuing");
        }

        self.store
            .tenant(&tenant_id)
            .ok_or_else(|| CoreError::not_found("tenant", tenant_id))
    }

    pub fn get_tenant(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
    ) -> Result<Arc<Tenant>, CoreError> {
        let tenant = self.tenant_or_not_found(tenant_id)?;
        authorize(principal, &Action::ReadTenant { tenant: &tenant }).into_result()?;
        Ok(tenant)
    }

    /// Tenants visible to the principal: all of them for admins, the
    /// managed set for everyone else.
    pub fn list_tenants(&self, principal: &Principal) -> Vec<Arc<Tenant>> {
        let mut tenants = self.store.tenants();
        if !principal.role.is_admin() {
            tenants.retain(|tenant| {
                principal.manages(&tenant.id) || tenant.is_manager(&principal.id)
            });
        }
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        tenants
    }

    pub fn rename_tenant(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
        name: &str,
    ) -> Result<Arc<Tenant>, CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        let tenant = self.tenant_or_not_found(tenant_id)?;
        if name.trim().is_empty() {
            return Err(CoreError::validation("tenant name must not be empty"));
        }

        let mut updated = (*tenant).clone();
        updated.name = name.to_owned();
        self.store.insert_tenant(updated);
        self.tenant_or_not_found(tenant_id)
    }

    pub fn delete_tenant(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
    ) -> Result<(), CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        self.store
            .delete_tenant(tenant_id)
            .ok_or_else(|| CoreError::not_found("tenant", tenant_id))?;
        info!(tenant_id = %tenant_id, "tenant deleted");
        Ok(())
    }

    /// Add a manager to a tenant. The owner is never added as a
    /// manager (the sets stay distinct).
    pub fn add_manager(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
        manager: PrincipalId,
    ) -> Result<(), CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        let tenant = self.tenant_or_not_found(tenant_id)?;

        let mut updated = (*tenant).clone();
        if !updated.add_manager(manager) && manager == updated.owner {
            return Err(CoreError::validation(
                "the tenant owner cannot also be a manager",
            ));
        }
        self.store.insert_tenant(updated);
        Ok(())
    }

    pub fn remove_manager(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
        manager: &PrincipalId,
    ) -> Result<(), CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        let tenant = self.tenant_or_not_found(tenant_id)?;

        let mut updated = (*tenant).clone();
        updated.remove_manager(manager);
        self.store.insert_tenant(updated);
        Ok(())
    }

    // ── Zone sync ────────────────────────────────────────────────────

    /// Converge the tenant's local domain list with the provider's
    /// zone list. Stale local domains are deleted (cascading); record
    /// content is left to the per-domain record sync.
    pub async fn sync_tenant_zones(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
    ) -> Result<ZoneSyncSummary, CoreError> {
        let tenant = self.tenant_or_not_found(tenant_id)?;
        authorize(principal, &Action::SyncZones { tenant: &tenant }).into_result()?;

        let client = self.client_for(&tenant)?;
        let zones = client.list_zones().await?;
        let summary = apply_zone_snapshot(&self.store, tenant.id, &zones);
        info!(
            tenant = %tenant.name,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            "zone sync complete"
        );
        Ok(summary)
    }

    // ── Domains ──────────────────────────────────────────────────────

    /// Domains visible to the principal.
    pub fn list_domains(&self, principal: &Principal) -> Vec<Arc<Domain>> {
        let mut domains = self.store.domains();
        if !principal.role.is_admin() {
            domains.retain(|domain| principal.manages(&domain.tenant_id));
        }
        domains.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        domains
    }

    /// Create a domain by hand (zone-sync discovery is the usual path).
    pub fn create_domain(
        &self,
        principal: &Principal,
        tenant_id: &TenantId,
        name: &str,
    ) -> Result<Arc<Domain>, CoreError> {
        authorize(principal, &Action::CreateDomain).into_result()?;
        self.tenant_or_not_found(tenant_id)?;
        if name.trim().is_empty() {
            return Err(CoreError::validation("domain name must not be empty"));
        }
        if self.store.domain_by_name(tenant_id, name).is_some() {
            return Err(CoreError::validation(format!(
                "domain '{name}' already exists for this tenant"
            )));
        }

        let domain = Domain::new(*tenant_id, name);
        let domain_id = domain.id;
        self.store.insert_domain(domain);
        self.domain_or_not_found(&domain_id)
    }

    pub fn update_domain(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
        change: &DomainChange,
    ) -> Result<Arc<Domain>, CoreError> {
        let domain = self.domain_or_not_found(domain_id)?;
        authorize(
            principal,
            &Action::UpdateDomain {
                domain: &domain,
                change,
                domain_has_cname: self.store.domain_has_cname(domain_id),
            },
        )
        .into_result()?;

        if let Some(name) = &change.name
            && *name != domain.name
            && self.store.domain_by_name(&domain.tenant_id, name).is_some()
        {
            return Err(CoreError::validation(format!(
                "domain '{name}' already exists for this tenant"
            )));
        }

        let mut updated = (*domain).clone();
        if change.apply_to(&mut updated) {
            self.store.insert_domain(updated);
        }
        self.domain_or_not_found(domain_id)
    }

    pub fn delete_domain(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
    ) -> Result<(), CoreError> {
        let domain = self.domain_or_not_found(domain_id)?;
        authorize(
            principal,
            &Action::DeleteDomain {
                domain: &domain,
                domain_has_cname: self.store.domain_has_cname(domain_id),
            },
        )
        .into_result()?;

        self.store.delete_domain(domain_id);
        Ok(())
    }

    // ── Records ──────────────────────────────────────────────────────

    /// Record listing for a domain: everything for admins, the
    /// visibility-filtered CNAME set for restricted principals.
    ///
    /// Refreshes the mirror from the provider first; a provider failure
    /// falls back to serving the stale mirror (best-effort read path).
    pub async fn list_records(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
    ) -> Result<Vec<Arc<DnsRecord>>, CoreError> {
        let domain = self.domain_or_not_found(domain_id)?;
        authorize(principal, &Action::ReadDomain { domain: &domain }).into_result()?;

        self.refresh_domain_records(&domain).await;

        let mut records = self.visible_records(principal, domain_id);
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// The record set a principal may see for a domain, from the mirror
    /// as-is (no refresh). Admins bypass the visibility filter.
    pub fn visible_records(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
    ) -> Vec<Arc<DnsRecord>> {
        if principal.role.is_admin() {
            return self.store.records_for_domain(domain_id);
        }

        let permission = self.store.permission_for(&principal.id, domain_id);
        compute_visible(&self.store, permission.as_deref())
    }

    /// The domain's A/AAAA records -- the pool of approvable grant
    /// targets, so administration-only like the grants themselves.
    ///
    /// Refreshes the mirror from the provider first, best effort.
    pub async fn address_records(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
    ) -> Result<Vec<Arc<DnsRecord>>, CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;
        let domain = self.domain_or_not_found(domain_id)?;

        self.refresh_domain_records(&domain).await;

        let mut records = self.store.records_of_type(domain_id, RecordType::A);
        records.extend(self.store.records_of_type(domain_id, RecordType::Aaaa));
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Create a record: gate, then provider, then mirror. The mirror
    /// row is built from the provider's response so normalized fields
    /// and the remote id come back verbatim.
    pub async fn create_record(
        &self,
        principal: &Principal,
        domain_id: &DomainId,
        draft: RecordDraft,
    ) -> Result<Arc<DnsRecord>, CoreError> {
        let domain = self.domain_or_not_found(domain_id)?;
        authorize(
            principal,
            &Action::CreateRecord {
                domain: &domain,
                draft: &draft,
            },
        )
        .into_result()?;
        validate_draft(&draft)?;

        let record = match &domain.zone_id {
            Some(zone_id) => {
                let tenant = self.tenant_or_not_found(&domain.tenant_id)?;
                let client = self.client_for(&tenant)?;
                let created = client
                    .create_record(zone_id, &payload_for_draft(&draft))
                    .await?;
                let mut record = draft.into_record(*domain_id, Some(created.id));
                record.name = created.name;
                record.content = created.content;
                record.ttl = created.ttl;
                record.proxied = created.proxied;
                record
            }
            // Domain not linked to a remote zone yet: local-only row,
            // picked up by reconciliation once the zone id appears.
            None => draft.into_record(*domain_id, None),
        };

        let record_id = record.id;
        self.store.insert_record(record);
        debug!(domain = %domain.name, record_id = %record_id, "record created");
        self.record_or_not_found(&record_id)
    }

    /// Update a record write-through: the mirror is only touched after
    /// the provider accepted the full merged payload.
    pub async fn update_record(
        &self,
        principal: &Principal,
        record_id: &RecordId,
        change: &RecordChange,
    ) -> Result<Arc<DnsRecord>, CoreError> {
        let record = self.record_or_not_found(record_id)?;
        let domain = self.domain_or_not_found(&record.domain_id)?;
        authorize(
            principal,
            &Action::UpdateRecord {
                domain: &domain,
                record: &record,
                change,
            },
        )
        .into_result()?;

        let merged = change.merged_over(&record);
        validate_record_fields(&merged)?;

        if let (Some(zone_id), Some(remote_id)) = (&domain.zone_id, &record.remote_id) {
            let tenant = self.tenant_or_not_found(&domain.tenant_id)?;
            let client = self.client_for(&tenant)?;
            client
                .update_record(zone_id, remote_id, &payload_for_record(&merged))
                .await?;
        }

        self.store.insert_record(merged);
        self.record_or_not_found(record_id)
    }

    /// Delete a record write-through: provider first, mirror second.
    pub async fn delete_record(
        &self,
        principal: &Principal,
        record_id: &RecordId,
    ) -> Result<(), CoreError> {
        let record = self.record_or_not_found(record_id)?;
        let domain = self.domain_or_not_found(&record.domain_id)?;
        authorize(
            principal,
            &Action::DeleteRecord {
                domain: &domain,
                record: &record,
            },
        )
        .into_result()?;

        if let (Some(zone_id), Some(remote_id)) = (&domain.zone_id, &record.remote_id) {
            let tenant = self.tenant_or_not_found(&domain.tenant_id)?;
            let client = self.client_for(&tenant)?;
            client.delete_record(zone_id, remote_id).await?;
        }

        self.store.delete_record(record_id);
        debug!(domain = %domain.name, record_id = %record_id, "record deleted");
        Ok(())
    }

    // ── Permission grants ────────────────────────────────────────────

    /// Replace a principal's visibility grants with a validated set.
    ///
    /// Each grant is checked against live rows (tenant exists, domain
    /// belongs to it, record belongs to the domain and is A/AAAA);
    /// invalid entries are dropped with a warning rather than failing
    /// the batch.
    pub fn apply_grants(
        &self,
        principal: &Principal,
        target: PrincipalId,
        grants: &[PermissionGrant],
    ) -> Result<usize, CoreError> {
        authorize(principal, &Action::AdministerTenants).into_result()?;

        let valid: Vec<&PermissionGrant> = grants
            .iter()
            .filter(|grant| self.grant_is_valid(grant))
            .collect();

        // Remove grants no longer requested, then add the new ones.
        for existing in self.store.permissions_for_principal(&target) {
            let still_wanted = valid.iter().any(|grant| {
                grant.domain_id == existing.domain_id
                    && Some(grant.record_id) == existing.allowed_record_id
            });
            if !still_wanted {
                self.store.delete_permission(&existing.id);
            }
        }
        for grant in &valid {
            self.store.insert_permission(UserDomainPermission::new(
                target,
                grant.domain_id,
                Some(grant.record_id),
            ));
        }

        Ok(valid.len())
    }

    fn grant_is_valid(&self, grant: &PermissionGrant) -> bool {
        if self.store.tenant(&grant.tenant_id).is_none() {
            warn!(tenant_id = %grant.tenant_id, "dropping grant: tenant does not exist");
            return false;
        }
        let Some(domain) = self.store.domain(&grant.domain_id) else {
            warn!(domain_id = %grant.domain_id, "dropping grant: domain does not exist");
            return false;
        };
        if domain.tenant_id != grant.tenant_id {
            warn!(
                domain_id = %grant.domain_id,
                tenant_id = %grant.tenant_id,
                "dropping grant: domain does not belong to tenant"
            );
            return false;
        }
        let Some(record) = self.store.record(&grant.record_id) else {
            warn!(record_id = %grant.record_id, "dropping grant: record does not exist");
            return false;
        };
        if record.domain_id != grant.domain_id {
            warn!(record_id = %grant.record_id, "dropping grant: record outside domain");
            return false;
        }
        if !record.record_type.is_address() {
            warn!(
                record_id = %grant.record_id,
                record_type = %record.record_type,
                "dropping grant: target must be an A/AAAA record"
            );
            return false;
        }
        true
    }

    // ── Dashboard panels ─────────────────────────────────────────────

    /// Entity counters scoped to the principal's visibility.
    pub fn stats(&self, principal: &Principal) -> DashboardStats {
        if principal.role.is_admin() {
            return DashboardStats {
                tenants: self.store.tenant_count(),
                domains: self.store.domain_count(),
                records: self
                    .store
                    .domains()
                    .iter()
                    .map(|domain| self.store.records_for_domain(&domain.id).len())
                    .sum(),
            };
        }

        let domains = self.list_domains(principal);
        DashboardStats {
            tenants: principal.managed_tenants.len(),
            domains: domains.len(),
            records: domains
                .iter()
                .map(|domain| self.store.records_for_domain(&domain.id).len())
                .sum(),
        }
    }

    /// Newest tenants, scoped to the principal's visibility.
    pub fn recent_tenants(&self, principal: &Principal, limit: usize) -> Vec<Arc<Tenant>> {
        let mut tenants = self.list_tenants(principal);
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tenants.truncate(limit);
        tenants
    }

    /// Newest CNAME records, scoped to the principal's tenants.
    pub fn recent_subdomains(&self, principal: &Principal, limit: usize) -> Vec<Arc<DnsRecord>> {
        if principal.role.is_admin() {
            self.store.recent_cnames(None, limit)
        } else {
            let tenants: Vec<TenantId> = principal.managed_tenants.iter().copied().collect();
            self.store.recent_cnames(Some(&tenants), limit)
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn client_for(&self, tenant: &Tenant) -> Result<CloudflareClient, CoreError> {
        let credentials = Credentials {
            email: tenant.credentials.email.clone(),
            api_key: tenant.credentials.api_key.clone(),
        };
        Ok(CloudflareClient::with_base_url(
            &credentials,
            &self.transport,
            self.api_base.clone(),
        )?)
    }

    /// Best-effort pre-read refresh: pull the domain's remote records
    /// into the mirror, falling back to the stale mirror on any
    /// provider failure.
    async fn refresh_domain_records(&self, domain: &Domain) {
        let Some(zone_id) = &domain.zone_id else {
            return;
        };
        let Some(tenant) = self.store.tenant(&domain.tenant_id) else {
            return;
        };

        let result = match self.client_for(&tenant) {
            Ok(client) => client.list_records(zone_id).await,
            Err(e) => {
                warn!(domain = %domain.name, error = %e, "could not build provider client");
                return;
            }
        };

        match result {
            Ok(remote_records) => {
                apply_record_snapshot(&self.store, domain, &remote_records);
            }
            Err(e) => {
                warn!(
                    domain = %domain.name,
                    error = %e,
                    "record refresh failed; serving stale mirror"
                );
            }
        }
    }

    /// Post-creation discovery: mirror the tenant's zones and each
    /// zone's records. Caller decides whether failure is fatal.
    async fn discover_tenant(&self, tenant_id: TenantId) -> Result<(), CoreError> {
        let tenant = self.tenant_or_not_found(&tenant_id)?;
        let client = self.client_for(&tenant)?;

        let zones = client.list_zones().await?;
        apply_zone_snapshot(&self.store, tenant_id, &zones);

        for domain in self.store.domains_for_tenant(&tenant_id) {
            let Some(zone_id) = &domain.zone_id else {
                continue;
            };
            // A failed zone leaves the rest of the pass intact: prior
            // upserts stay applied, per the best-effort policy.
            let remote_records = client.list_records(zone_id).await?;
            apply_record_snapshot(&self.store, &domain, &remote_records);
        }
        Ok(())
    }

    fn tenant_or_not_found(&self, id: &TenantId) -> Result<Arc<Tenant>, CoreError> {
        self.store
            .tenant(id)
            .ok_or_else(|| CoreError::not_found("tenant", id))
    }

    fn domain_or_not_found(&self, id: &DomainId) -> Result<Arc<Domain>, CoreError> {
        self.store
            .domain(id)
            .ok_or_else(|| CoreError::not_found("domain", id))
    }

    fn record_or_not_found(&self, id: &RecordId) -> Result<Arc<DnsRecord>, CoreError> {
        self.store
            .record(id)
            .ok_or_else(|| CoreError::not_found("record", id))
    }
}

// ── Payload builders ─────────────────────────────────────────────────

fn payload_for_draft(draft: &RecordDraft) -> RecordPayload {
    RecordPayload {
        record_type: draft.record_type.to_string(),
        name: draft.name.clone(),
        content: draft.content.clone(),
        ttl: draft.ttl,
        proxied: draft.proxied,
        priority: priority_for(draft.record_type, draft.priority),
    }
}

fn payload_for_record(record: &DnsRecord) -> RecordPayload {
    RecordPayload {
        record_type: record.record_type.to_string(),
        name: record.name.clone(),
        content: record.content.clone(),
        ttl: record.ttl,
        proxied: record.proxied,
        priority: priority_for(record.record_type, record.priority),
    }
}

/// Priority is an MX-only field; never send it for other types.
fn priority_for(record_type: RecordType, priority: Option<u16>) -> Option<u16> {
    if record_type == RecordType::Mx {
        priority
    } else {
        None
    }
}

fn validate_draft(draft: &RecordDraft) -> Result<(), CoreError> {
    if draft.name.trim().is_empty() {
        return Err(CoreError::validation("record name must not be empty"));
    }
    if draft.content.trim().is_empty() {
        return Err(CoreError::validation("record content must not be empty"));
    }
    if draft.record_type == RecordType::Mx && draft.priority.is_none() {
        return Err(CoreError::validation("MX records require a priority"));
    }
    Ok(())
}

fn validate_record_fields(record: &DnsRecord) -> Result<(), CoreError> {
    if record.name.trim().is_empty() {
        return Err(CoreError::validation("record name must not be empty"));
    }
    if record.content.trim().is_empty() {
        return Err(CoreError::validation("record content must not be empty"));
    }
    Ok(())
}
