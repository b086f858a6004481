// ── Reconciliation engine ──
//
// Pure application of remote snapshots onto the local mirror. The
// service layer fetches; these functions diff and write, so every
// convergence property is testable without a network.
//
// Policy: domains are authoritative-remote (zone sync deletes local
// domains the provider no longer reports), records are soft-cached
// (record sync upserts but never deletes). All record types are
// synced; CNAME visibility filtering happens at read time.

use std::str::FromStr;

use chrono::Utc;
use tracing::{debug, warn};

use strato_api::models::{Record as RemoteRecord, Zone as RemoteZone};

use crate::model::{DnsRecord, Domain, DomainId, RecordId, RecordType, TenantId};
use crate::store::{MirrorStore, Upsert};

/// Outcome of one record-sync pass over a domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordSyncSummary {
    pub created: usize,
    pub updated: usize,
    /// Remote records skipped because their type is outside the
    /// dashboard's managed set (e.g. SRV, NS).
    pub skipped: usize,
}

/// Outcome of one tenant-wide zone-sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneSyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Total zones the provider reported.
    pub total_remote: usize,
}

/// Upsert every remote record into the mirror, keyed by
/// (domain, remote record id).
///
/// Absent rows are inserted; existing rows have their mutable fields
/// (name, type, content, ttl, proxied, priority) overwritten only when
/// a field-by-field comparison finds a difference, so re-applying the
/// same snapshot is a no-op. Local records absent from the snapshot
/// are left alone.
pub fn apply_record_snapshot(
    store: &MirrorStore,
    domain: &Domain,
    remote_records: &[RemoteRecord],
) -> RecordSyncSummary {
    let mut summary = RecordSyncSummary::default();

    for remote in remote_records {
        let Ok(record_type) = RecordType::from_str(&remote.record_type) else {
            debug!(
                record_type = %remote.record_type,
                name = %remote.name,
                "skipping remote record of unmanaged type"
            );
            summary.skipped += 1;
            continue;
        };

        let outcome = store.upsert_record_by_remote_id(
            domain.id,
            &remote.id,
            || record_from_remote(domain.id, record_type, remote),
            |existing| refreshed_fields(existing, record_type, remote),
        );
        match outcome {
            Upsert::Created => summary.created += 1,
            Upsert::Updated => summary.updated += 1,
            Upsert::Unchanged => {}
        }
    }

    debug!(
        domain = %domain.name,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "record sync pass applied"
    );
    summary
}

/// Converge the tenant's local domain list with the remote zone list.
///
/// Remote zones are upserted by name (status, proxied flag, and zone
/// id refreshed only on difference); local domains whose name the
/// provider no longer reports are deleted, cascading their records and
/// permissions. Running the same snapshot twice yields the same local
/// state.
pub fn apply_zone_snapshot(
    store: &MirrorStore,
    tenant_id: TenantId,
    remote_zones: &[RemoteZone],
) -> ZoneSyncSummary {
    let mut summary = ZoneSyncSummary {
        total_remote: remote_zones.len(),
        ..ZoneSyncSummary::default()
    };

    for zone in remote_zones {
        let outcome = store.upsert_domain_by_name(
            tenant_id,
            &zone.name,
            || domain_from_zone(tenant_id, zone),
            |existing| refreshed_domain(existing, zone),
        );
        match outcome {
            Upsert::Created => summary.created += 1,
            Upsert::Updated => summary.updated += 1,
            Upsert::Unchanged => {}
        }
    }

    // Local domains the provider no longer reports are stale.
    for domain in store.domains_for_tenant(&tenant_id) {
        if !remote_zones.iter().any(|zone| zone.name == domain.name) {
            warn!(domain = %domain.name, "deleting local domain absent from remote zone list");
            store.delete_domain(&domain.id);
            summary.deleted += 1;
        }
    }

    summary
}

fn domain_from_zone(tenant_id: TenantId, zone: &RemoteZone) -> Domain {
    let mut domain = Domain::new(tenant_id, zone.name.clone());
    domain.proxied = !zone.paused;
    domain.status = zone.status.clone();
    domain.zone_id = Some(zone.id.clone());
    domain
}

/// Zone counterpart of [`refreshed_fields`].
fn refreshed_domain(existing: &Domain, zone: &RemoteZone) -> Option<Domain> {
    let proxied = !zone.paused;
    let unchanged = existing.proxied == proxied
        && existing.status == zone.status
        && existing.zone_id.as_deref() == Some(zone.id.as_str());

    if unchanged {
        return None;
    }

    let mut refreshed = existing.clone();
    refreshed.proxied = proxied;
    refreshed.status = zone.status.clone();
    refreshed.zone_id = Some(zone.id.clone());
    Some(refreshed)
}

fn record_from_remote(
    domain_id: DomainId,
    record_type: RecordType,
    remote: &RemoteRecord,
) -> DnsRecord {
    DnsRecord {
        id: RecordId::new(),
        domain_id,
        record_type,
        name: remote.name.clone(),
        content: remote.content.clone(),
        ttl: remote.ttl,
        proxied: remote.proxied,
        priority: remote.priority,
        remote_id: Some(remote.id.clone()),
        created_at: Utc::now(),
    }
}

/// Field-by-field comparison against the remote state. Returns the
/// refreshed row only when something actually differs -- no spurious
/// writes on identical snapshots.
fn refreshed_fields(
    existing: &DnsRecord,
    record_type: RecordType,
    remote: &RemoteRecord,
) -> Option<DnsRecord> {
    let unchanged = existing.record_type == record_type
        && existing.name == remote.name
        && existing.content == remote.content
        && existing.ttl == remote.ttl
        && existing.proxied == remote.proxied
        && existing.priority == remote.priority;

    if unchanged {
        return None;
    }

    let mut refreshed = existing.clone();
    refreshed.record_type = record_type;
    refreshed.name = remote.name.clone();
    refreshed.content = remote.content.clone();
    refreshed.ttl = remote.ttl;
    refreshed.proxied = remote.proxied;
    refreshed.priority = remote.priority;
    Some(refreshed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{PrincipalId, ProviderCredentials, Tenant};

    fn seeded_store() -> (MirrorStore, Tenant) {
        let store = MirrorStore::new();
        let tenant = Tenant::new(
            "acme",
            PrincipalId::new(),
            ProviderCredentials::new("ops@acme.test", "key"),
        );
        store.insert_tenant(tenant.clone());
        (store, tenant)
    }

    fn remote_record(id: &str, record_type: &str, name: &str, content: &str) -> RemoteRecord {
        RemoteRecord {
            id: id.into(),
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
            ttl: 3600,
            proxied: false,
            priority: None,
        }
    }

    fn remote_zone(id: &str, name: &str, status: &str) -> RemoteZone {
        RemoteZone {
            id: id.into(),
            name: name.into(),
            status: status.into(),
            paused: false,
        }
    }

    #[test]
    fn record_sync_mirrors_every_remote_record() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "example.com");
        store.insert_domain(domain.clone());

        let remote = vec![
            remote_record("cf-1", "A", "a.example.com", "203.0.113.9"),
            remote_record("cf-2", "CNAME", "www.example.com", "a.example.com"),
            remote_record("cf-3", "TXT", "example.com", "v=spf1 -all"),
        ];

        let summary = apply_record_snapshot(&store, &domain, &remote);
        assert_eq!(summary.created, 3);
        assert_eq!(summary.updated, 0);

        for r in &remote {
            let local = store.record_by_remote_id(&domain.id, &r.id).unwrap();
            assert_eq!(local.name, r.name);
            assert_eq!(local.content, r.content);
            assert_eq!(local.ttl, r.ttl);
            assert_eq!(local.proxied, r.proxied);
        }
    }

    #[test]
    fn record_sync_is_idempotent() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "example.com");
        store.insert_domain(domain.clone());

        let remote = vec![remote_record("cf-1", "CNAME", "www.example.com", "a.example.com")];

        let first = apply_record_snapshot(&store, &domain, &remote);
        assert_eq!((first.created, first.updated), (1, 0));

        // Same snapshot again: no duplicate row, no spurious update.
        let second = apply_record_snapshot(&store, &domain, &remote);
        assert_eq!((second.created, second.updated), (0, 0));
        assert_eq!(store.records_for_domain(&domain.id).len(), 1);
    }

    #[test]
    fn record_sync_overwrites_only_changed_fields() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "example.com");
        store.insert_domain(domain.clone());

        apply_record_snapshot(
            &store,
            &domain,
            &[remote_record("cf-1", "CNAME", "www.example.com", "a.example.com")],
        );
        let original = store.record_by_remote_id(&domain.id, "cf-1").unwrap();

        let summary = apply_record_snapshot(
            &store,
            &domain,
            &[remote_record("cf-1", "CNAME", "www.example.com", "b.example.com")],
        );
        assert_eq!(summary.updated, 1);

        let refreshed = store.record_by_remote_id(&domain.id, "cf-1").unwrap();
        assert_eq!(refreshed.content, "b.example.com");
        // Local identity survives the refresh.
        assert_eq!(refreshed.id, original.id);
    }

    #[test]
    fn record_sync_never_deletes_stale_local_records() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "example.com");
        store.insert_domain(domain.clone());

        apply_record_snapshot(
            &store,
            &domain,
            &[
                remote_record("cf-1", "CNAME", "www.example.com", "a.example.com"),
                remote_record("cf-2", "TXT", "example.com", "v=spf1 -all"),
            ],
        );

        // Provider now reports only one record; the stale one stays.
        apply_record_snapshot(
            &store,
            &domain,
            &[remote_record("cf-1", "CNAME", "www.example.com", "a.example.com")],
        );
        assert_eq!(store.records_for_domain(&domain.id).len(), 2);
    }

    #[test]
    fn record_sync_normalizes_type_case_and_skips_unmanaged_types() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "example.com");
        store.insert_domain(domain.clone());

        let summary = apply_record_snapshot(
            &store,
            &domain,
            &[
                remote_record("cf-1", "cname", "www.example.com", "a.example.com"),
                remote_record("cf-2", "SRV", "_sip._tcp.example.com", "sip.example.com"),
            ],
        );

        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 1);
        let local = store.record_by_remote_id(&domain.id, "cf-1").unwrap();
        assert_eq!(local.record_type, RecordType::Cname);
    }

    #[test]
    fn concurrent_record_syncs_never_duplicate_a_remote_record() {
        for _ in 0..64 {
            let (store, tenant) = seeded_store();
            let domain = Domain::new(tenant.id, "example.com");
            store.insert_domain(domain.clone());
            let remote = vec![remote_record("cf-1", "CNAME", "www.example.com", "a.example.com")];

            let barrier = std::sync::Barrier::new(8);
            let created: usize = std::thread::scope(|scope| {
                let workers: Vec<_> = (0..8)
                    .map(|_| {
                        scope.spawn(|| {
                            barrier.wait();
                            apply_record_snapshot(&store, &domain, &remote).created
                        })
                    })
                    .collect();
                workers.into_iter().map(|w| w.join().unwrap()).sum()
            });

            // Exactly one pass inserts; the rest observe the row.
            assert_eq!(created, 1);
            assert_eq!(store.records_for_domain(&domain.id).len(), 1);
        }
    }

    #[test]
    fn concurrent_zone_syncs_never_duplicate_a_domain() {
        for _ in 0..64 {
            let (store, tenant) = seeded_store();
            let remote = vec![remote_zone("z1", "example.com", "active")];

            let barrier = std::sync::Barrier::new(8);
            std::thread::scope(|scope| {
                for _ in 0..8 {
                    scope.spawn(|| {
                        barrier.wait();
                        apply_zone_snapshot(&store, tenant.id, &remote);
                    });
                }
            });

            assert_eq!(store.domains_for_tenant(&tenant.id).len(), 1);
        }
    }

    #[test]
    fn zone_sync_creates_updates_and_deletes_to_match_remote() {
        let (store, tenant) = seeded_store();

        // Seed: one domain that will survive, one that will go stale.
        store.insert_domain(Domain::new(tenant.id, "keep.com"));
        let stale = Domain::new(tenant.id, "stale.com");
        let stale_id = stale.id;
        store.insert_domain(stale);

        let remote = vec![
            remote_zone("z1", "keep.com", "active"),
            remote_zone("z2", "new.com", "pending"),
        ];

        let summary = apply_zone_snapshot(&store, tenant.id, &remote);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1); // keep.com gains its zone id
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.total_remote, 2);

        assert!(store.domain(&stale_id).is_none());
        let kept = store.domain_by_name(&tenant.id, "keep.com").unwrap();
        assert_eq!(kept.zone_id.as_deref(), Some("z1"));
        let created = store.domain_by_name(&tenant.id, "new.com").unwrap();
        assert_eq!(created.status, "pending");
    }

    #[test]
    fn zone_sync_is_idempotent() {
        let (store, tenant) = seeded_store();
        let remote = vec![remote_zone("z1", "example.com", "active")];

        apply_zone_snapshot(&store, tenant.id, &remote);
        let second = apply_zone_snapshot(&store, tenant.id, &remote);

        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.deleted, 0);
        assert_eq!(store.domains_for_tenant(&tenant.id).len(), 1);
    }

    #[test]
    fn zone_sync_deletion_cascades_records() {
        let (store, tenant) = seeded_store();
        let domain = Domain::new(tenant.id, "stale.com");
        let domain_id = domain.id;
        store.insert_domain(domain.clone());
        apply_record_snapshot(
            &store,
            &domain,
            &[remote_record("cf-1", "CNAME", "www.stale.com", "a.stale.com")],
        );

        apply_zone_snapshot(&store, tenant.id, &[]);

        assert!(store.domain(&domain_id).is_none());
        assert!(store.records_for_domain(&domain_id).is_empty());
    }
}
