// Cloudflare v4 HTTP client
//
// Wraps `reqwest::Client` with v4 URL construction and envelope
// unwrapping. One HTTP round trip per method, no retries -- retry
// policy belongs to the caller. All methods return unwrapped `result`
// payloads; the envelope is stripped before the caller sees it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ApiMessage, Credentials, Envelope, Record, RecordPayload, Zone};
use crate::transport::TransportConfig;

/// Default production endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4/";

/// Raw HTTP client for the Cloudflare v4 zones/records API.
///
/// Handles the `{ success, result, errors }` envelope and failure
/// classification. A `success: false` body at HTTP 200 is treated
/// identically to an HTTP 4xx: the provider's error messages are
/// joined and surfaced as [`Error::Rejected`].
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CloudflareClient {
    /// Create a client for the production endpoint.
    pub fn new(credentials: &Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_base_url(credentials, transport, DEFAULT_API_BASE.parse()?)
    }

    /// Create a client against a custom endpoint (test servers, proxies).
    ///
    /// `base_url` must end with a trailing slash for relative joins to
    /// resolve under it.
    pub fn with_base_url(
        credentials: &Credentials,
        transport: &TransportConfig,
        base_url: Url,
    ) -> Result<Self, Error> {
        let http = transport.build_client(credentials)?;
        Ok(Self { http, base_url })
    }

    /// The configured API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET zones` -- list every zone visible to the credentials.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        self.get(self.url("zones")?).await
    }

    /// `GET zones/{zone}/dns_records` -- full record set for a zone.
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>, Error> {
        self.get(self.url(&format!("zones/{zone_id}/dns_records"))?)
            .await
    }

    /// `POST zones/{zone}/dns_records` -- create one record.
    pub async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<Record, Error> {
        self.post(self.url(&format!("zones/{zone_id}/dns_records"))?, payload)
            .await
    }

    /// `PUT zones/{zone}/dns_records/{record}` -- overwrite one record.
    pub async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<Record, Error> {
        self.put(
            self.url(&format!("zones/{zone_id}/dns_records/{record_id}"))?,
            payload,
        )
        .await
    }

    /// `DELETE zones/{zone}/dns_records/{record}` -- delete one record.
    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), Error> {
        // The delete envelope's `result` is `{ id }`; we only care that
        // the call succeeded.
        let _: serde_json::Value = self
            .delete(self.url(&format!("zones/{zone_id}/dns_records/{record_id}"))?)
            .await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        parse_envelope(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        parse_envelope(resp).await
    }

    async fn put<T: DeserializeOwned>(&self, url: Url, body: &impl Serialize) -> Result<T, Error> {
        debug!("PUT {}", url);
        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        parse_envelope(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        parse_envelope(resp).await
    }
}

/// Classify the response and unwrap the `{ success, result, errors }`
/// envelope.
///
/// Classification order: auth (401/403), throttle (429), server errors
/// (5xx), then the envelope itself -- `success: false` surfaces the
/// provider's joined error messages whether the status is 200 or 4xx.
async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: auth_message(&body),
        });
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        return Err(Error::RateLimited { retry_after_secs });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    // 5xx is the provider failing, not the request being rejected;
    // callers may treat it as transient.
    if status.is_server_error() {
        return Err(Error::Unexpected {
            message: envelope_errors(&body).unwrap_or_else(|| body.clone()),
            status: Some(status.as_u16()),
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
        // Non-JSON error pages on 4xx still classify as a rejection.
        if status.is_client_error() {
            Error::Rejected {
                message: body.clone(),
                status: status.as_u16(),
            }
        } else {
            Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            }
        }
    })?;

    if !envelope.success {
        return Err(Error::Rejected {
            message: ApiMessage::join(&envelope.errors),
            status: status.as_u16(),
        });
    }

    envelope.result.ok_or_else(|| Error::Deserialization {
        message: "successful envelope without result payload".to_owned(),
        body,
    })
}

/// Pull the provider's joined error list out of a body that may or may
/// not be a well-formed envelope.
fn envelope_errors(body: &str) -> Option<String> {
    match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => Some(ApiMessage::join(&envelope.errors)),
        _ => None,
    }
}

fn auth_message(body: &str) -> String {
    envelope_errors(body).unwrap_or_else(|| "credentials rejected by Cloudflare".to_owned())
}
