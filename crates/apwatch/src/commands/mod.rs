//! Command dispatch: bridges CLI args -> the monitor -> output formatting.

pub mod cache;
pub mod config_cmd;
pub mod connection;
pub mod credentials;
pub mod status;
pub mod watch;

use apwatch_config::{Config, FileRosterCache, KeyringSecretStore};
use apwatch_core::{Monitor, MonitorConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::identity::HostIdentity;

/// The monitor every command runs against.
pub type AppMonitor = Monitor<KeyringSecretStore, FileRosterCache, HostIdentity>;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    tracing::debug!(command = ?cmd, "dispatching command");
    match cmd {
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Status(args) => status::handle(args, global).await,
        Command::Refresh(args) => status::handle_refresh(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Credentials(args) => credentials::handle(args, global),
        Command::Test => connection::handle(global).await,
        Command::Cache(args) => cache::handle(args, global).await,
    }
}

/// Build a monitor from the config file, with the given identity source.
pub fn build_monitor(
    config: &Config,
    identity: HostIdentity,
    tune: impl FnOnce(&mut MonitorConfig),
) -> Result<AppMonitor, CliError> {
    let mut monitor_config = config.monitor_config();
    tune(&mut monitor_config);
    Ok(Monitor::new(
        config.secret_store(),
        config.roster_cache(),
        identity,
        monitor_config,
    )?)
}
