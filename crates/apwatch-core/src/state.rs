// ── Connection state derivation ──
//
// What one cycle saw, reduced to a ConnectionState. Kept free of I/O so
// every branch is testable without timers, networks or fakes.

use crate::model::{AccessPoint, ConnectionState, NetworkIdentity};

/// Outcome of reading the host's wireless association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityReading {
    /// The capability check failed.
    Denied,
    /// The read itself failed.
    Failed,
    /// Not associated with any wireless network.
    Absent,
    Present(NetworkIdentity),
}

/// Everything a cycle established before it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub identity: IdentityReading,
    pub credentials_present: bool,
    pub roster_available: bool,
    pub matched: Option<AccessPoint>,
}

impl Observation {
    pub fn new(identity: IdentityReading) -> Self {
        Self {
            identity,
            credentials_present: false,
            roster_available: false,
            matched: None,
        }
    }

    pub fn network_identity(&self) -> Option<&NetworkIdentity> {
        match &self.identity {
            IdentityReading::Present(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Map an observation to its connection state.
pub fn derive_state(observation: &Observation) -> ConnectionState {
    match observation.identity {
        IdentityReading::Denied | IdentityReading::Failed => ConnectionState::Error,
        IdentityReading::Absent => ConnectionState::Disconnected,
        IdentityReading::Present(_) => {
            if !observation.credentials_present || !observation.roster_available {
                ConnectionState::Error
            } else if observation.matched.is_some() {
                ConnectionState::Connected
            } else {
                ConnectionState::Away
            }
        }
    }
}
