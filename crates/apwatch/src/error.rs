//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use apwatch_config::ConfigError;
use apwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Controller ───────────────────────────────────────────────────
    #[error("Could not reach the controller: {message}")]
    #[diagnostic(
        code(apwatch::connection_failed),
        help(
            "Check that the controller is running and reachable from this host.\n\
             Try: apwatch test -v"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(apwatch::auth_failed),
        help(
            "Verify the stored username and password.\n\
             Run: apwatch credentials set --controller <URL> --username <USER>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured ({message})")]
    #[diagnostic(
        code(apwatch::no_credentials),
        help(
            "Store them with: apwatch credentials set --controller <URL> --username <USER>\n\
             Or set APWATCH_CONTROLLER, APWATCH_USERNAME and APWATCH_PASSWORD."
        )
    )]
    NoCredentials { message: String },

    #[error("Unexpected response from controller: {message}")]
    #[diagnostic(code(apwatch::api_error))]
    ApiError { message: String },

    #[error("The controller reported no access points")]
    #[diagnostic(
        code(apwatch::no_access_points),
        help("Check the configured site name: apwatch config show")
    )]
    NoAccessPoints,

    // ── Host ─────────────────────────────────────────────────────────
    #[error("Cannot read the current Wi-Fi network: {message}")]
    #[diagnostic(
        code(apwatch::permission_denied),
        help("Make sure NetworkManager is running and this user may query it (polkit).")
    )]
    PermissionDenied { message: String },

    #[error("Wi-Fi network unavailable: {message}")]
    #[diagnostic(code(apwatch::identity_unavailable))]
    IdentityUnavailable { message: String },

    #[error("Storage error: {message}")]
    #[diagnostic(code(apwatch::storage))]
    Storage { message: String },

    #[error("Nothing cached yet")]
    #[diagnostic(code(apwatch::cache_empty), help("Populate it with: apwatch cache update"))]
    CacheEmpty,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(apwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {source}")]
    #[diagnostic(code(apwatch::config), help("Config file: {path}"))]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── Serialization ────────────────────────────────────────────────
    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(apwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(apwatch::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoAccessPoints | Self::CacheEmpty => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::ConfigurationMissing { message } => CliError::NoCredentials { message },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::SessionExpired { status } => CliError::AuthFailed {
                message: format!("session rejected (HTTP {status})"),
            },
            CoreError::TransportFailure { message } => CliError::ConnectionFailed { message },
            CoreError::ResponseFormat { message } => CliError::ApiError { message },
            CoreError::EmptyResult => CliError::NoAccessPoints,
            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },
            CoreError::IdentityUnavailable { message } => CliError::IdentityUnavailable { message },
            CoreError::Storage { message } => CliError::Storage { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(source: ConfigError) -> Self {
        CliError::Config {
            source,
            path: apwatch_config::config_path().display().to_string(),
        }
    }
}
