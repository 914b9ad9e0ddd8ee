//! Output formatting: table or JSON.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! JSON serializes the underlying value via serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use apwatch_core::{AccessPoint, ConnectionState, MonitorSnapshot};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_state(state: ConnectionState, color: bool) -> String {
    let label = state.label();
    if !color {
        return label.to_string();
    }
    match state {
        ConnectionState::Connected => label.green().bold().to_string(),
        ConnectionState::Away => label.yellow().to_string(),
        ConnectionState::Disconnected => label.dimmed().to_string(),
        ConnectionState::Error => label.red().bold().to_string(),
        ConnectionState::Unknown => label.to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

/// Render a single item; `detail_fn` produces the table view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

// ── Domain views ─────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct AccessPointRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Adopted")]
    adopted: String,
}

impl From<&AccessPoint> for AccessPointRow {
    fn from(ap: &AccessPoint) -> Self {
        Self {
            name: ap.display_name().to_string(),
            mac: ap.hardware_address.to_string(),
            model: ap.model.clone(),
            online: yes_no(ap.is_online()),
            adopted: yes_no(ap.adopted),
        }
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.into()
}

/// Multi-line table view of a snapshot.
pub fn snapshot_detail(snapshot: &MonitorSnapshot, color: bool) -> String {
    let mut lines = vec![
        format!("State:    {}", paint_state(snapshot.state, color)),
        format!("Network:  {}", snapshot.network_name.as_deref().unwrap_or("-")),
        format!("BSSID:    {}", snapshot.radio_address.as_deref().unwrap_or("-")),
    ];
    if let Some(ref ap) = snapshot.access_point {
        lines.push(format!(
            "AP:       {} ({}, {})",
            ap.display_name(),
            ap.hardware_address,
            ap.model
        ));
    }
    if let Some(ref err) = snapshot.error {
        lines.push(format!("Error:    {err}"));
    }
    lines.push(format!(
        "Updated:  {}",
        snapshot.last_updated.map_or_else(
            || "-".into(),
            |t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string()
        )
    ));
    lines.join("\n")
}

/// One line per snapshot, for `watch` in table mode.
pub fn snapshot_line(snapshot: &MonitorSnapshot, color: bool) -> String {
    let time = snapshot.last_updated.map_or_else(
        || "--:--:--".into(),
        |t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
    );
    let detail = match (&snapshot.access_point, &snapshot.error) {
        (Some(ap), _) => ap.display_name().to_string(),
        (None, Some(err)) => err.clone(),
        (None, None) => snapshot.network_name.clone().unwrap_or_default(),
    };
    format!("{time}  {:<12}  {detail}", paint_state(snapshot.state, color))
}
