// ── Domain types ──
//
// HardwareAddress is the normalized radio identifier every comparison
// works on. AccessPoint and Roster are the controller's fleet as this
// crate sees it; ConnectionState is the per-cycle verdict.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use apwatch_api::DeviceRecord;

// ── HardwareAddress ─────────────────────────────────────────────────

/// MAC / BSSID normalized to lowercase hex with separators stripped
/// (`aabbccddeeff`).
///
/// Normalization never fails; [`is_well_formed`](Self::is_well_formed)
/// tells whether the result is a full 48-bit address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HardwareAddress(String);

impl HardwareAddress {
    /// Accepts colon-separated, dash-separated, dotted, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .flat_map(char::to_lowercase)
            .collect();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exactly 12 hex characters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 12 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// The six 2-character octets, or `None` if not well formed.
    pub fn octets(&self) -> Option<[&str; 6]> {
        if !self.is_well_formed() {
            return None;
        }
        let s = self.0.as_str();
        Some([
            &s[0..2],
            &s[2..4],
            &s[4..6],
            &s[6..8],
            &s[8..10],
            &s[10..12],
        ])
    }
}

impl fmt::Display for HardwareAddress {
    /// Colon-separated when well formed, the raw normalized text otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.octets() {
            Some(octets) => write!(f, "{}", octets.join(":")),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for HardwareAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for HardwareAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<HardwareAddress> for String {
    fn from(addr: HardwareAddress) -> Self {
        addr.0
    }
}

// ── AccessPoint ─────────────────────────────────────────────────────

/// One access point of the managed fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub id: String,
    pub hardware_address: HardwareAddress,
    /// May be empty; see [`display_name`](Self::display_name).
    pub name: String,
    pub model: String,
    pub state_code: i64,
    pub adopted: bool,
}

impl AccessPoint {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.model
        } else {
            &self.name
        }
    }

    pub fn is_online(&self) -> bool {
        self.state_code == 1
    }
}

impl From<DeviceRecord> for AccessPoint {
    fn from(d: DeviceRecord) -> Self {
        Self {
            id: d.id,
            hardware_address: HardwareAddress::new(&d.mac),
            name: d.name.unwrap_or_default(),
            model: d.model,
            state_code: d.state,
            adopted: d.adopted,
        }
    }
}

// ── Roster ──────────────────────────────────────────────────────────

/// Ordered set of access points, unique by `id`.
///
/// Always replaced wholesale; there are no partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AccessPoint>", into = "Vec<AccessPoint>")]
pub struct Roster(Vec<AccessPoint>);

impl Roster {
    /// Build a roster, keeping the first entry for any repeated `id`.
    pub fn new(access_points: Vec<AccessPoint>) -> Self {
        let mut seen = HashSet::new();
        Self(
            access_points
                .into_iter()
                .filter(|ap| seen.insert(ap.id.clone()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccessPoint> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[AccessPoint] {
        &self.0
    }
}

impl From<Vec<AccessPoint>> for Roster {
    fn from(access_points: Vec<AccessPoint>) -> Self {
        Self::new(access_points)
    }
}

impl From<Roster> for Vec<AccessPoint> {
    fn from(roster: Roster) -> Self {
        roster.0
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a AccessPoint;
    type IntoIter = std::slice::Iter<'a, AccessPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── NetworkIdentity ─────────────────────────────────────────────────

/// What the OS reports about the current wireless association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    /// SSID, if the OS exposes it.
    pub network_name: Option<String>,
    /// BSSID as reported, before normalization.
    pub radio_address: String,
}

// ── ConnectionState ─────────────────────────────────────────────────

/// Per-cycle verdict. Recomputed every cycle, never patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Associated with a fleet access point.
    Connected,
    /// Associated with Wi-Fi, but not a fleet member.
    Away,
    /// No wireless association.
    Disconnected,
    /// The cycle could not decide.
    Error,
    /// No cycle has completed yet.
    #[default]
    Unknown,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Away => "Away from home",
            Self::Disconnected => "Not connected",
            Self::Error => "Error",
            Self::Unknown => "Checking...",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
