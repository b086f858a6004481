// ── DNS record ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::id::{DomainId, RecordId};

/// The record types the dashboard manages.
///
/// Parsing is case-insensitive: provider payloads carry mixed-case
/// type strings, so everything is normalized through this enum before
/// comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
}

impl RecordType {
    /// `true` for the address types a permission may target.
    pub fn is_address(self) -> bool {
        matches!(self, Self::A | Self::Aaaa)
    }
}

/// A DNS record mirrored from the remote zone.
///
/// `remote_id` is the reconciliation key: when present it is unique
/// within the owning domain, and upserts join on (domain_id, remote_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: RecordId,
    pub domain_id: DomainId,
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    /// MX records only.
    pub priority: Option<u16>,
    pub remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a record through the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDraft {
    pub record_type: RecordType,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub priority: Option<u16>,
}

fn default_ttl() -> u32 {
    3600
}

impl RecordDraft {
    /// Materialize the draft into a local row for a domain.
    pub fn into_record(self, domain_id: DomainId, remote_id: Option<String>) -> DnsRecord {
        DnsRecord {
            id: RecordId::new(),
            domain_id,
            record_type: self.record_type,
            name: self.name,
            content: self.content,
            ttl: self.ttl,
            proxied: self.proxied,
            priority: self.priority,
            remote_id,
            created_at: Utc::now(),
        }
    }
}

/// Partial update to a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordChange {
    pub record_type: Option<RecordType>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    pub priority: Option<u16>,
}

impl RecordChange {
    /// The type the record will have after this change is applied.
    pub fn type_after(&self, current: &DnsRecord) -> RecordType {
        self.record_type.unwrap_or(current.record_type)
    }

    /// Merge the change over the current record into the full payload
    /// sent to the provider (PUT overwrites every mutable field).
    pub fn merged_over(&self, current: &DnsRecord) -> DnsRecord {
        DnsRecord {
            id: current.id,
            domain_id: current.domain_id,
            record_type: self.type_after(current),
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            content: self
                .content
                .clone()
                .unwrap_or_else(|| current.content.clone()),
            ttl: self.ttl.unwrap_or(current.ttl),
            proxied: self.proxied.unwrap_or(current.proxied),
            priority: self.priority.or(current.priority),
            remote_id: current.remote_id.clone(),
            created_at: current.created_at,
        }
    }
}
