//! `test`: log in with the stored credentials on a fresh session.

use apwatch_config::load_config;
use apwatch_core::{CoreError, load_credentials, missing_accounts};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::identity::HostIdentity;
use crate::output::{self, AccessPointRow};

use super::build_monitor;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config()?;
    let monitor = build_monitor(&config, HostIdentity::from_args(None, None), |_| {})?;

    let Some(credentials) = load_credentials(monitor.secrets())? else {
        let missing = missing_accounts(monitor.secrets())?;
        return Err(CoreError::ConfigurationMissing {
            message: format!("missing {}", missing.join(", ")),
        }
        .into());
    };

    let (dialect, roster) = monitor.test_connection(&credentials).await?;
    eprintln!(
        "Connected to {} ({dialect:?} API), {} access points",
        credentials.base_url,
        roster.len()
    );

    let out = output::render_list(global.output, roster.as_slice(), |ap| AccessPointRow::from(ap))?;
    output::print_output(&out);
    Ok(())
}
