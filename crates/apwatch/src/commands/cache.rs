//! `cache update | info | clear`.

use serde::Serialize;

use apwatch_config::load_config;
use apwatch_core::CacheInfo;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;
use crate::identity::HostIdentity;
use crate::output;

use super::build_monitor;

#[derive(Serialize)]
struct CacheView {
    path: String,
    #[serde(flatten)]
    info: CacheInfo,
}

fn detail(view: &CacheView) -> String {
    let fetched = view.info.fetched_at.map_or_else(
        || "-".into(),
        |t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    );
    [
        format!("Path:           {}", view.path),
        format!("Access points:  {}", view.info.count),
        format!("Fetched:        {fetched}"),
    ]
    .join("\n")
}

pub async fn handle(args: CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config()?;
    let path = config.cache_file().display().to_string();
    let monitor = build_monitor(&config, HostIdentity::from_args(None, None), |_| {})?;

    let info = match args.command {
        CacheCommand::Update => monitor.update_cache().await?,
        CacheCommand::Info => monitor.cache_info().ok_or(CliError::CacheEmpty)?,
        CacheCommand::Clear => {
            monitor.clear_cache()?;
            eprintln!("Cache cleared: {path}");
            return Ok(());
        }
    };

    let view = CacheView { path, info };
    let out = output::render_single(global.output, &view, detail)?;
    output::print_output(&out);
    Ok(())
}
