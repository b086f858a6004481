use thiserror::Error;

/// Top-level error type for the `strato-api` crate.
///
/// Every failure mode of a Cloudflare call is classified here:
/// authentication, throttling, provider-rejected requests, transport,
/// and deserialization. `strato-core` maps these into user-facing
/// diagnostics. Callers never see a raw transport panic.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the provider (401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Throttling ──────────────────────────────────────────────────
    /// Rate limited by the provider (429). Includes retry-after in seconds
    /// when the provider supplied one.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Provider rejection ──────────────────────────────────────────
    /// Request rejected by the provider. Covers both HTTP 4xx responses
    /// and `success: false` envelopes at HTTP 200 -- the two are
    /// indistinguishable to callers. Carries the joined provider message
    /// list. Server-side failures (5xx) classify as [`Error::Unexpected`]
    /// instead.
    #[error("Cloudflare API error (HTTP {status}): {message}")]
    Rejected { message: String, status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Fallback ────────────────────────────────────────────────────
    /// Server-side failure (HTTP 5xx) or anything the classifier could
    /// not place in a bucket above. Carries the HTTP status when one
    /// was observed.
    #[error("Unexpected Cloudflare API failure: {message}")]
    Unexpected {
        message: String,
        status: Option<u16>,
    },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The client itself never retries; this is a hint for callers
    /// that own the retry policy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Unexpected {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the provider reported the target as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Rejected { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if re-authenticating with fresh credentials
    /// might resolve the failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
