// Shared transport configuration for building reqwest::Client instances.
//
// Controllers are administrator-owned LAN appliances with self-signed
// certificates, so certificate verification is always disabled. The
// timeout is the only per-call deadline; nothing above it adds another.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("apwatch/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Deadline applied to every request (connect + body).
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that stores session cookies in `jar`.
    pub fn build_client(&self, jar: &Arc<Jar>) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .cookie_provider(Arc::clone(jar))
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
