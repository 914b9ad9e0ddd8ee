// ── BSSID matching ──
//
// A UniFi radio advertises one pseudo-BSSID per SSID, each differing from
// the base MAC in a few low-order bits. Exact matching only catches the
// base address, so a scored octet comparison runs when it misses.

use crate::model::{AccessPoint, HardwareAddress, Roster};

/// Minimum number of identical octets (out of six) for a fuzzy match.
pub const MIN_MATCHING_OCTETS: usize = 4;

/// Find the roster entry the observed BSSID belongs to.
///
/// 1. Exact match on the normalized address.
/// 2. Observed address not 12 hex characters: no match.
/// 3. Highest count of identical octets among well-formed entries, at
///    least [`MIN_MATCHING_OCTETS`]. Ties go to the entry seen first.
pub fn match_access_point<'a>(observed: &str, roster: &'a Roster) -> Option<&'a AccessPoint> {
    let observed = HardwareAddress::new(observed);

    if let Some(exact) = roster.iter().find(|ap| ap.hardware_address == observed) {
        return Some(exact);
    }

    let observed_octets = observed.octets()?;

    let mut best: Option<(&AccessPoint, usize)> = None;
    for ap in roster {
        let Some(octets) = ap.hardware_address.octets() else {
            continue;
        };
        let score = observed_octets
            .iter()
            .zip(octets.iter())
            .filter(|(a, b)| a == b)
            .count();
        if score < MIN_MATCHING_OCTETS {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((ap, score));
        }
    }

    best.map(|(ap, _)| ap)
}
