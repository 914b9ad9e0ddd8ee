//! Clap derive structures for the `apwatch` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// apwatch -- is this host on one of our access points?
#[derive(Debug, Parser)]
#[command(
    name = "apwatch",
    version,
    about = "Check whether the current Wi-Fi access point belongs to a UniFi controller's fleet",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "APWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one cycle and print the result
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Keep cycling on the configured interval and print every result
    Watch(WatchArgs),

    /// Discard the held roster, fetch a fresh one, and print the result
    Refresh(IdentityArgs),

    /// Manage controller credentials in the system keyring
    #[command(alias = "creds")]
    Credentials(CredentialsArgs),

    /// Log in with the stored credentials and list the access points found
    Test,

    /// Manage the on-disk roster cache
    Cache(CacheArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

// ── Shared arguments ─────────────────────────────────────────────────

/// Override the host's wireless identity instead of asking NetworkManager.
#[derive(Debug, Clone, Default, Args)]
pub struct IdentityArgs {
    /// Network name to report
    #[arg(long, requires = "bssid")]
    pub ssid: Option<String>,

    /// Access point BSSID to report (e.g. aa:bb:cc:dd:ee:ff)
    #[arg(long)]
    pub bssid: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Ignore the on-disk roster cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Cycle period in seconds (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Credentials ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub command: CredentialsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CredentialsCommand {
    /// Store controller URL, username, and password
    Set {
        /// Controller base URL (e.g. https://192.168.1.1)
        #[arg(long, short = 'c')]
        controller: String,

        /// Controller username
        #[arg(long, short = 'u')]
        username: String,
    },

    /// Show which credentials are stored (never the password)
    Show,

    /// Delete stored credentials
    Clear,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Fetch the roster from the controller and write it to the cache
    Update,

    /// Show what the cache holds
    Info,

    /// Delete the cache file
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration
    Show,

    /// Write the resolved configuration to the config file
    Init,
}
