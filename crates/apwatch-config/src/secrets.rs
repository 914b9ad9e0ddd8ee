// ── Keyring-backed SecretStore ──
//
// One keyring entry per account under the configured service. Environment
// variables win over the keyring on reads, so CI and containers can run
// without a secret service.

use tracing::debug;

use apwatch_core::{
    ACCOUNT_CONTROLLER_URL, ACCOUNT_PASSWORD, ACCOUNT_USERNAME, SecretStore, StoreError,
};

pub const ENV_CONTROLLER: &str = "APWATCH_CONTROLLER";
pub const ENV_USERNAME: &str = "APWATCH_USERNAME";
pub const ENV_PASSWORD: &str = "APWATCH_PASSWORD";

fn env_var_for(account: &str) -> Option<&'static str> {
    match account {
        ACCOUNT_CONTROLLER_URL => Some(ENV_CONTROLLER),
        ACCOUNT_USERNAME => Some(ENV_USERNAME),
        ACCOUNT_PASSWORD => Some(ENV_PASSWORD),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
    env_overrides: bool,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            env_overrides: true,
        }
    }

    /// Read the keyring only, ignoring `APWATCH_*` credential variables.
    #[cfg(test)]
    #[must_use]
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The environment variable currently overriding `account`, if any.
    pub fn env_override(&self, account: &str) -> Option<&'static str> {
        if !self.env_overrides {
            return None;
        }
        env_var_for(account).filter(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()))
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, account).map_err(|e| backend(account, &e))
    }
}

fn backend(account: &str, err: &keyring::Error) -> StoreError {
    StoreError::Backend(format!("keyring entry '{account}': {err}"))
}

fn not_found_or_backend(account: &str, err: &keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoEntry => StoreError::NotFound {
            account: account.into(),
        },
        other => backend(account, other),
    }
}

impl SecretStore for KeyringSecretStore {
    fn set(&self, account: &str, value: &str) -> Result<(), StoreError> {
        self.entry(account)?
            .set_password(value)
            .map_err(|e| backend(account, &e))?;
        debug!(service = %self.service, account, "keyring entry written");
        Ok(())
    }

    fn get(&self, account: &str) -> Result<String, StoreError> {
        if let Some(var) = self.env_override(account) {
            if let Ok(value) = std::env::var(var) {
                debug!(account, var, "credential taken from environment");
                return Ok(value);
            }
        }
        self.entry(account)?
            .get_password()
            .map_err(|e| not_found_or_backend(account, &e))
    }

    fn delete(&self, account: &str) -> Result<(), StoreError> {
        self.entry(account)?
            .delete_credential()
            .map_err(|e| not_found_or_backend(account, &e))
    }
}
