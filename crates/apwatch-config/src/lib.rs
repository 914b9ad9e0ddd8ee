//! Configuration and OS-backed storage for apwatch.
//!
//! TOML settings layered with `APWATCH_*` environment variables, the
//! keyring-backed [`SecretStore`](apwatch_core::SecretStore), and the
//! JSON roster cache under the platform cache directory. Translates the
//! settings to `apwatch_core::MonitorConfig`.

mod cache;
mod secrets;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use apwatch_core::{MonitorConfig, TransportConfig};

pub use cache::{CACHE_FILE_NAME, FileRosterCache};
pub use secrets::{ENV_CONTROLLER, ENV_PASSWORD, ENV_USERNAME, KeyringSecretStore};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Seconds between background cycles.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Per-request deadline for controller calls.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Controller site name.
    #[serde(default = "default_site")]
    pub site: String,

    /// Reuse the on-disk roster when nothing is held in memory.
    #[serde(default = "default_true")]
    pub use_local_cache: bool,

    /// Override for the roster cache file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Keyring service the credentials are stored under.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            timeout_secs: default_timeout(),
            site: default_site(),
            use_local_cache: true,
            cache_path: None,
            keyring_service: default_keyring_service(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    30
}
fn default_timeout() -> u64 {
    15
}
fn default_site() -> String {
    "default".into()
}
fn default_true() -> bool {
    true
}
fn default_keyring_service() -> String {
    "apwatch".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.site.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "site".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.keyring_service.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "keyring_service".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Runtime settings for the reconciliation loop.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            transport: TransportConfig {
                timeout: Duration::from_secs(self.timeout_secs),
            },
            site: self.site.clone(),
            use_local_cache: self.use_local_cache,
        }
    }

    /// `cache_path` if set, else `roster.json` in the platform cache dir.
    pub fn cache_file(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| cache_dir().join(CACHE_FILE_NAME))
    }

    pub fn secret_store(&self) -> KeyringSecretStore {
        KeyringSecretStore::new(&self.keyring_service)
    }

    pub fn roster_cache(&self) -> FileRosterCache {
        FileRosterCache::new(self.cache_file())
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "apwatch", "apwatch")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "apwatch", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Platform cache directory for apwatch.
pub fn cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".cache", "apwatch"]),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load from the canonical config path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then `APWATCH_*`.
///
/// The credential variables are left for [`KeyringSecretStore`].
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("APWATCH_").ignore(&["controller", "username", "password"]));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
