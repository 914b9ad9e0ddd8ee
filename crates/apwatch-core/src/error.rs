// ── Core error types ──
//
// User-facing errors from apwatch-core. Consumers never see HTTP status
// codes or serde failures directly; the `From<apwatch_api::Error>` impl
// translates transport-layer errors into this taxonomy.

use thiserror::Error;

use crate::ports::{IdentityError, StoreError};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("No credentials configured: {message}")]
    ConfigurationMissing { message: String },

    // ── Controller errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired (HTTP {status})")]
    SessionExpired { status: u16 },

    #[error("Cannot reach controller: {message}")]
    TransportFailure { message: String },

    #[error("Unexpected response from controller: {message}")]
    ResponseFormat { message: String },

    #[error("No access points found")]
    EmptyResult,

    // ── Host errors ──────────────────────────────────────────────────
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Network identity unavailable: {message}")]
    IdentityUnavailable { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CoreError {
    /// Returns `true` for failures that another cycle may clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure { .. } | Self::SessionExpired { .. } | Self::IdentityUnavailable { .. }
        )
    }
}

// ── Conversion from lower-layer errors ───────────────────────────────

impl From<apwatch_api::Error> for CoreError {
    fn from(err: apwatch_api::Error) -> Self {
        match err {
            apwatch_api::Error::InvalidUrl { url, reason } => CoreError::InvalidInput {
                message: format!("controller URL '{url}': {reason}"),
            },
            apwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            apwatch_api::Error::SessionExpired { status } => CoreError::SessionExpired { status },
            apwatch_api::Error::Transport(ref e) => CoreError::TransportFailure {
                message: if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
            },
            apwatch_api::Error::Tls(message) => CoreError::TransportFailure { message },
            apwatch_api::Error::InvalidResponse { status } => CoreError::ResponseFormat {
                message: format!("HTTP {status}"),
            },
            apwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::ResponseFormat { message }
            }
        }
    }
}

impl From<IdentityError> for CoreError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::PermissionDenied(message) => CoreError::PermissionDenied { message },
            IdentityError::Unavailable(message) => CoreError::IdentityUnavailable { message },
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Storage {
            message: err.to_string(),
        }
    }
}
