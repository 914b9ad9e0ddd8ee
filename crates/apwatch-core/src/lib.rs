//! Fleet-membership monitoring between `apwatch-api` and its callers.
//!
//! Answers one question on a schedule: is the radio this host is associated
//! with part of the access-point fleet a UniFi controller manages?
//!
//! - **[`Monitor`]**: The reconciliation loop. Each cycle reads the current
//!   network identity, makes sure a session and roster exist, matches the
//!   observed BSSID and publishes a [`MonitorSnapshot`] through a `watch`
//!   channel. Overlapping triggers are dropped, never queued.
//!
//! - **[`DeviceDirectory`]**: Fetches the controller's device list, keeps
//!   access points only, and re-authenticates exactly once on 401/403.
//!
//! - **[`match_access_point`]**: Tolerant BSSID matching: exact first, then
//!   best octet overlap with at most two differing octets.
//!
//! - **Ports** ([`SecretStore`], [`LocalCache`], [`NetworkIdentityProvider`]):
//!   The OS-facing collaborators, injected by the caller.
//!
//! - **[`derive_state`]**: Pure mapping from one cycle's observation to a
//!   [`ConnectionState`].

pub mod credentials;
pub mod directory;
pub mod error;
pub mod matcher;
pub mod model;
pub mod monitor;
pub mod ports;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use credentials::{
    ACCOUNT_CONTROLLER_URL, ACCOUNT_PASSWORD, ACCOUNT_USERNAME, CREDENTIAL_ACCOUNTS,
    delete_credentials, load_credentials, missing_accounts, read_optional, save_credentials,
};
pub use directory::DeviceDirectory;
pub use error::CoreError;
pub use matcher::{MIN_MATCHING_OCTETS, match_access_point};
pub use model::{AccessPoint, ConnectionState, HardwareAddress, NetworkIdentity, Roster};
pub use monitor::{CacheInfo, CycleOutcome, Monitor, MonitorConfig, MonitorSnapshot};
pub use ports::{IdentityError, LocalCache, NetworkIdentityProvider, SecretStore, StoreError};
pub use state::{IdentityReading, Observation, derive_state};

pub use apwatch_api::{ControllerCredentials, Dialect, TransportConfig};
