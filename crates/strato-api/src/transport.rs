// Shared transport configuration for building reqwest::Client instances.
//
// Each tenant carries its own Cloudflare credentials, so clients are
// built per tenant; the timeout and header plumbing live here to avoid
// duplicated builder logic.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;

use crate::error::Error;
use crate::models::Credentials;

const AUTH_EMAIL_HEADER: &str = "x-auth-email";
const AUTH_KEY_HEADER: &str = "x-auth-key";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` carrying the tenant's auth headers
    /// (`X-Auth-Email` / `X-Auth-Key`) as defaults on every request.
    pub fn build_client(&self, credentials: &Credentials) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();

        let email = HeaderValue::from_str(&credentials.email)
            .map_err(|e| Error::Unexpected {
                message: format!("invalid auth email header: {e}"),
                status: None,
            })?;
        headers.insert(HeaderName::from_static(AUTH_EMAIL_HEADER), email);

        let mut key = HeaderValue::from_str(credentials.api_key.expose_secret())
            .map_err(|e| Error::Unexpected {
                message: format!("invalid API key header: {e}"),
                status: None,
            })?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(AUTH_KEY_HEADER), key);

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("strato/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Unexpected {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
            })
    }
}
