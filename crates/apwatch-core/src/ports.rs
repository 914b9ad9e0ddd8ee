// ── External collaborators ──
//
// The loop never touches the keychain, the disk, or the OS wireless stack
// directly. Callers inject implementations of these traits; tests inject
// in-memory fakes.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{NetworkIdentity, Roster};

/// Failure of a [`SecretStore`] or [`LocalCache`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entry for account '{account}'")]
    NotFound { account: String },

    #[error("secret store error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Opaque named-credential storage.
///
/// Each account is an independent entry, so partial presence is
/// observable.
pub trait SecretStore: Send + Sync {
    fn set(&self, account: &str, value: &str) -> Result<(), StoreError>;

    /// `StoreError::NotFound` when the account has no entry.
    fn get(&self, account: &str) -> Result<String, StoreError>;

    fn delete(&self, account: &str) -> Result<(), StoreError>;
}

/// Opaque storage for one serialized roster plus its fetch time.
pub trait LocalCache: Send + Sync {
    fn save(&self, roster: &Roster, fetched_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// `None` when nothing usable is cached.
    fn load(&self) -> Option<Roster>;

    fn timestamp(&self) -> Option<DateTime<Utc>>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Failure to read the current wireless association.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Blocked by OS policy (location permission, polkit, ...).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The wireless stack could not be queried.
    #[error("network identity unavailable: {0}")]
    Unavailable(String),
}

/// Source of the currently associated SSID/BSSID.
pub trait NetworkIdentityProvider: Send + Sync {
    /// Capability check the loop runs before every read.
    fn check_access(&self) -> Result<(), IdentityError>;

    /// `Ok(None)` when not associated with any wireless network.
    fn current_identity(
        &self,
    ) -> impl Future<Output = Result<Option<NetworkIdentity>, IdentityError>> + Send;
}
