// Cloudflare v4 wire types.
//
// These mirror the provider's JSON shapes exactly; strato-core converts
// them into its own domain types. The `{ success, result, errors }`
// envelope is internal to the client -- callers only ever see unwrapped
// `result` payloads.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Per-tenant Cloudflare credentials (global API key auth).
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email, sent as `X-Auth-Email`.
    pub email: String,
    /// Global API key, sent as `X-Auth-Key`.
    pub api_key: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }
}

/// A zone as returned by `GET /zones`.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Provider lifecycle status (`active`, `pending`, `moved`, ...).
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub paused: bool,
}

fn default_status() -> String {
    "active".to_owned()
}

/// A DNS record as returned by the `dns_records` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    /// Present for MX records only.
    #[serde(default)]
    pub priority: Option<u16>,
}

/// Request body for record create/update calls.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPayload {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

// ── Envelope ────────────────────────────────────────────────────────

/// The v4 `{ success, result, errors, messages }` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ApiMessage {
    /// Join an error list into the single human-readable string that
    /// surfaces in [`Error::Rejected`](crate::Error::Rejected).
    pub(crate) fn join(errors: &[Self]) -> String {
        if errors.is_empty() {
            return "provider reported failure without error details".to_owned();
        }
        errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
