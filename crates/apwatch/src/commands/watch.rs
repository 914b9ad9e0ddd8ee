//! `watch`: run the timer loop and stream snapshots until Ctrl-C.

use std::time::Duration;

use apwatch_config::load_config;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::identity::HostIdentity;
use crate::output;

use super::build_monitor;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config()?;
    if args.interval == Some(0) {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let monitor = build_monitor(
        &config,
        HostIdentity::from_args(args.identity.ssid, args.identity.bssid),
        |m| {
            if let Some(secs) = args.interval {
                m.refresh_interval = Duration::from_secs(secs);
            }
        },
    )?;

    let color = output::should_color(global.color);
    // One JSON document per line when streaming.
    let format = match global.output {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };

    let mut updates = monitor.subscribe();
    monitor.start().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let out = output::render_single(format, &snapshot, |s| output::snapshot_line(s, color))?;
                output::print_output(&out);
            }
        }
    }

    monitor.stop().await;
    Ok(())
}
