// ── Visibility filter ──
//
// Restricted principals see only the CNAMEs of a domain that resolve
// to their one approved A/AAAA target. Matching is exact string
// equality after normalization -- no wildcard or suffix logic.

use std::sync::Arc;

use crate::model::{DnsRecord, RecordType, UserDomainPermission};
use crate::store::MirrorStore;

/// Normalize a DNS name for comparison: lower-case, trailing dot
/// stripped. `"A.EXAMPLE.COM."` and `"a.example.com"` compare equal.
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// The CNAMEs in `records` whose content points at `target_name`.
pub fn visible_cnames(records: &[Arc<DnsRecord>], target_name: &str) -> Vec<Arc<DnsRecord>> {
    let target = normalize_name(target_name);
    records
        .iter()
        .filter(|record| {
            record.record_type == RecordType::Cname
                && normalize_name(&record.content) == target
        })
        .map(Arc::clone)
        .collect()
}

/// Resolve a restricted principal's visible record set for a domain.
///
/// Empty when no permission row exists, when the permission has no
/// allowed record, or when the allowed record has since been deleted
/// (its reference is nulled by the store).
pub fn compute_visible(
    store: &MirrorStore,
    permission: Option<&UserDomainPermission>,
) -> Vec<Arc<DnsRecord>> {
    let Some(permission) = permission else {
        return Vec::new();
    };
    let Some(allowed_id) = permission.allowed_record_id else {
        return Vec::new();
    };
    let Some(allowed) = store.record(&allowed_id) else {
        return Vec::new();
    };

    let records = store.records_for_domain(&permission.domain_id);
    visible_cnames(&records, &allowed.name)
}
