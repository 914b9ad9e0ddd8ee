// ── Credential persistence through a SecretStore ──
//
// URL, username and password live under three independent accounts so a
// half-configured store can be detected and reported precisely.

use secrecy::ExposeSecret;
use tracing::debug;

use apwatch_api::{ControllerCredentials, parse_base_url};

use crate::error::CoreError;
use crate::ports::SecretStore;

pub const ACCOUNT_CONTROLLER_URL: &str = "controller.url";
pub const ACCOUNT_USERNAME: &str = "controller.username";
pub const ACCOUNT_PASSWORD: &str = "controller.password";

pub const CREDENTIAL_ACCOUNTS: [&str; 3] =
    [ACCOUNT_CONTROLLER_URL, ACCOUNT_USERNAME, ACCOUNT_PASSWORD];

/// Read one account. Absent and empty values are both `None`.
pub fn read_optional(
    store: &impl SecretStore,
    account: &str,
) -> Result<Option<String>, CoreError> {
    match store.get(account) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load all three accounts. `None` unless every one is present.
pub fn load_credentials(
    store: &impl SecretStore,
) -> Result<Option<ControllerCredentials>, CoreError> {
    let url = read_optional(store, ACCOUNT_CONTROLLER_URL)?;
    let username = read_optional(store, ACCOUNT_USERNAME)?;
    let password = read_optional(store, ACCOUNT_PASSWORD)?;

    Ok(match (url, username, password) {
        (Some(url), Some(username), Some(password)) => {
            Some(ControllerCredentials::new(url, username, password))
        }
        _ => None,
    })
}

/// Accounts with no stored value, in [`CREDENTIAL_ACCOUNTS`] order.
pub fn missing_accounts(store: &impl SecretStore) -> Result<Vec<&'static str>, CoreError> {
    let mut missing = Vec::new();
    for account in CREDENTIAL_ACCOUNTS {
        if read_optional(store, account)?.is_none() {
            missing.push(account);
        }
    }
    Ok(missing)
}

/// Validate and persist credentials.
///
/// All three fields must be non-empty and the URL must parse; nothing is
/// written otherwise.
pub fn save_credentials(
    store: &impl SecretStore,
    credentials: &ControllerCredentials,
) -> Result<(), CoreError> {
    let password = credentials.password.expose_secret();
    for (field, value) in [
        ("controller URL", credentials.base_url.as_str()),
        ("username", credentials.username.as_str()),
        ("password", password),
    ] {
        if value.trim().is_empty() {
            return Err(CoreError::InvalidInput {
                message: format!("{field} is required"),
            });
        }
    }
    parse_base_url(&credentials.base_url)?;

    store.set(ACCOUNT_CONTROLLER_URL, credentials.base_url.trim())?;
    store.set(ACCOUNT_USERNAME, &credentials.username)?;
    store.set(ACCOUNT_PASSWORD, password)?;
    debug!("credentials saved");
    Ok(())
}

/// Remove all three accounts. Absent entries are not an error.
pub fn delete_credentials(store: &impl SecretStore) -> Result<(), CoreError> {
    for account in CREDENTIAL_ACCOUNTS {
        match store.delete(account) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }
    debug!("credentials deleted");
    Ok(())
}
