//! One-shot cycles: `status` and `refresh`.

use apwatch_config::load_config;
use apwatch_core::{CycleOutcome, MonitorSnapshot};

use crate::cli::{GlobalOpts, IdentityArgs, StatusArgs};
use crate::error::CliError;
use crate::identity::HostIdentity;
use crate::output;

use super::{AppMonitor, build_monitor};

pub async fn handle(args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = monitor_for(&args.identity, args.no_cache)?;
    let outcome = monitor.refresh().await;
    print_snapshot(&monitor, &outcome, global)
}

pub async fn handle_refresh(args: IdentityArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = monitor_for(&args, false)?;
    let outcome = monitor.force_refresh().await;
    print_snapshot(&monitor, &outcome, global)
}

fn monitor_for(identity: &IdentityArgs, no_cache: bool) -> Result<AppMonitor, CliError> {
    let config = load_config()?;
    build_monitor(
        &config,
        HostIdentity::from_args(identity.ssid.clone(), identity.bssid.clone()),
        |m| {
            if no_cache {
                m.use_local_cache = false;
            }
        },
    )
}

fn print_snapshot(
    monitor: &AppMonitor,
    outcome: &CycleOutcome,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot: MonitorSnapshot = outcome
        .snapshot()
        .cloned()
        .unwrap_or_else(|| monitor.snapshot());
    let color = output::should_color(global.color);
    let out = output::render_single(global.output, &snapshot, |s| {
        output::snapshot_detail(s, color)
    })?;
    output::print_output(&out);
    Ok(())
}
