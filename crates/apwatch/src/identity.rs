//! Host wireless identity from NetworkManager, or from the command line.

use std::io::ErrorKind;

use tracing::debug;

use apwatch_core::{IdentityError, NetworkIdentity, NetworkIdentityProvider};

const NMCLI: &str = "nmcli";

/// Terse output with separators inside values escaped as `\:`.
const NMCLI_ARGS: [&str; 10] = [
    "-t",
    "--escape",
    "yes",
    "-f",
    "ACTIVE,SSID,BSSID",
    "dev",
    "wifi",
    "list",
    "--rescan",
    "no",
];

/// Substrings nmcli prints when polkit refuses the request.
const DENIED_MARKERS: [&str; 3] = ["not authorized", "insufficient privileges", "permission denied"];

// ── nmcli ────────────────────────────────────────────────────────────

/// Reads the active access point with `nmcli -t --escape yes -f ACTIVE,SSID,BSSID dev wifi`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NmcliIdentityProvider;

impl NetworkIdentityProvider for NmcliIdentityProvider {
    fn check_access(&self) -> Result<(), IdentityError> {
        let found = std::env::var_os("PATH")
            .is_some_and(|paths| std::env::split_paths(&paths).any(|dir| dir.join(NMCLI).is_file()));
        if found {
            Ok(())
        } else {
            Err(IdentityError::Unavailable(format!("{NMCLI} not found on PATH")))
        }
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        let output = tokio::process::Command::new(NMCLI)
            .args(NMCLI_ARGS)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => IdentityError::PermissionDenied(e.to_string()),
                _ => IdentityError::Unavailable(format!("failed to run {NMCLI}: {e}")),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let lowered = stderr.to_lowercase();
            return Err(if DENIED_MARKERS.iter().any(|m| lowered.contains(m)) {
                IdentityError::PermissionDenied(stderr)
            } else {
                IdentityError::Unavailable(format!("{NMCLI} exited with {}: {stderr}", output.status))
            });
        }

        let identity = parse_active(&String::from_utf8_lossy(&output.stdout));
        debug!(?identity, "nmcli reading");
        Ok(identity)
    }
}

/// Split one terse-mode line on unescaped `:`.
fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.extend(chars.next()),
            ':' => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}

/// The first line whose ACTIVE column is `yes`.
fn parse_active(stdout: &str) -> Option<NetworkIdentity> {
    stdout.lines().find_map(|line| {
        let fields = split_terse(line);
        let [active, ssid, bssid] = fields.as_slice() else {
            return None;
        };
        if active != "yes" || bssid.is_empty() {
            return None;
        }
        Some(NetworkIdentity {
            network_name: (!ssid.is_empty()).then(|| ssid.clone()),
            radio_address: bssid.clone(),
        })
    })
}

// ── Fixed identity ───────────────────────────────────────────────────

/// Reports a caller-supplied identity (`--ssid/--bssid`).
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    identity: Option<NetworkIdentity>,
}

impl StaticIdentityProvider {
    pub fn new(network_name: Option<String>, radio_address: String) -> Self {
        Self {
            identity: Some(NetworkIdentity {
                network_name,
                radio_address,
            }),
        }
    }
}

impl NetworkIdentityProvider for StaticIdentityProvider {
    fn check_access(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        Ok(self.identity.clone())
    }
}

// ── Selection ────────────────────────────────────────────────────────

/// The provider a command runs with.
#[derive(Debug, Clone)]
pub enum HostIdentity {
    Nmcli(NmcliIdentityProvider),
    Static(StaticIdentityProvider),
}

impl HostIdentity {
    /// `--bssid` wins over NetworkManager.
    pub fn from_args(ssid: Option<String>, bssid: Option<String>) -> Self {
        match bssid {
            Some(bssid) => Self::Static(StaticIdentityProvider::new(ssid, bssid)),
            None => Self::Nmcli(NmcliIdentityProvider),
        }
    }
}

impl NetworkIdentityProvider for HostIdentity {
    fn check_access(&self) -> Result<(), IdentityError> {
        match self {
            Self::Nmcli(p) => p.check_access(),
            Self::Static(p) => p.check_access(),
        }
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        match self {
            Self::Nmcli(p) => p.current_identity().await,
            Self::Static(p) => p.current_identity().await,
        }
    }
}
