// ── Core error types ──
//
// User-facing errors from strato-core. Provider failures keep their
// classification (auth / throttle / rejected / transport) but are
// re-stated in domain vocabulary; consumers never see a raw
// `reqwest::Error`. The `From<strato_api::Error>` impl is the single
// translation point.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Provider errors (classified, never retried here) ─────────────
    #[error("Provider authentication failed: {message}")]
    ProviderAuth { message: String },

    #[error("Provider rate limited -- retry after {retry_after_secs}s")]
    ProviderRateLimited { retry_after_secs: u64 },

    #[error("Provider rejected the request: {message}")]
    ProviderRejected { message: String, status: u16 },

    #[error("Provider unreachable: {message}")]
    ProviderTransport { message: String },

    #[error("Unexpected provider failure: {message}")]
    ProviderUnexpected { message: String },

    // ── Authorization ────────────────────────────────────────────────
    /// The permission gate denied the operation. Carries the violated
    /// rule verbatim.
    #[error("Permission denied: {rule}")]
    PermissionDenied { rule: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl CoreError {
    pub(crate) fn not_found(entity: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity,
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from provider-layer errors ───────────────────────────

impl From<strato_api::Error> for CoreError {
    fn from(err: strato_api::Error) -> Self {
        match err {
            strato_api::Error::Authentication { message } => CoreError::ProviderAuth { message },
            strato_api::Error::RateLimited { retry_after_secs } => {
                CoreError::ProviderRateLimited { retry_after_secs }
            }
            strato_api::Error::Rejected { message, status } => {
                CoreError::ProviderRejected { message, status }
            }
            strato_api::Error::Transport(e) => CoreError::ProviderTransport {
                message: e.to_string(),
            },
            strato_api::Error::InvalidUrl(e) => CoreError::ProviderUnexpected {
                message: format!("invalid provider URL: {e}"),
            },
            strato_api::Error::Deserialization { message, .. } => CoreError::ProviderUnexpected {
                message: format!("malformed provider response: {message}"),
            },
            strato_api::Error::Unexpected { message, .. } => {
                CoreError::ProviderUnexpected { message }
            }
        }
    }
}
