use thiserror::Error;

/// Top-level error type for the `apwatch-api` crate.
///
/// Covers every failure mode of the controller conversation: URL
/// validation, login negotiation, transport, and payload decoding.
/// `apwatch-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Input ───────────────────────────────────────────────────────
    /// The controller base URL is malformed. Raised before any network call.
    #[error("Invalid controller URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Every login strategy was rejected by the controller.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A request was rejected with 401/403 after login.
    #[error("Session expired (HTTP {status}) -- re-authentication required")]
    SessionExpired { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response ────────────────────────────────────────────────────
    /// Any non-200 status other than an authorization failure.
    #[error("Invalid response from controller (HTTP {status})")]
    InvalidResponse { status: u16 },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Failed to parse response: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is gone
    /// and one re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns `true` if the failure happened below HTTP (no response at all).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
