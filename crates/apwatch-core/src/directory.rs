// ── Device directory ──
//
// Fetch the controller's device list through a ControllerSession and reduce
// it to the access-point roster. Holds no cache: whether a fetch happens at
// all is the monitor's decision.

use tracing::{debug, info};

use apwatch_api::{ControllerCredentials, ControllerSession, device_list_url, parse_base_url};

use crate::error::CoreError;
use crate::model::{AccessPoint, Roster};

/// Builds device-list URLs for one site and turns responses into a [`Roster`].
#[derive(Debug, Clone)]
pub struct DeviceDirectory {
    site: String,
}

impl DeviceDirectory {
    pub fn new(site: impl Into<String>) -> Self {
        Self { site: site.into() }
    }

    /// Fetch the roster using the session's current dialect.
    ///
    /// A 401/403 triggers one re-authentication with `credentials` and one
    /// retried fetch; a second rejection surfaces as `AuthenticationFailed`.
    /// Other failures are returned as-is and never retried.
    pub async fn fetch_roster(
        &self,
        session: &mut ControllerSession,
        credentials: &ControllerCredentials,
    ) -> Result<Roster, CoreError> {
        let base = parse_base_url(&credentials.base_url)?;

        let url = device_list_url(&base, session.dialect(), &self.site)?;
        let records = match session.get_devices(url).await {
            Err(e) if e.is_auth_expired() => {
                info!(error = %e, "controller rejected session, re-authenticating");
                session.authenticate(credentials).await?;

                let url = device_list_url(&base, session.dialect(), &self.site)?;
                session.get_devices(url).await.map_err(|e| {
                    if e.is_auth_expired() {
                        CoreError::AuthenticationFailed {
                            message: format!("session rejected again after re-authentication: {e}"),
                        }
                    } else {
                        e.into()
                    }
                })?
            }
            other => other?,
        };

        let total = records.len();
        let roster = Roster::new(
            records
                .into_iter()
                .filter(apwatch_api::DeviceRecord::is_access_point)
                .map(AccessPoint::from)
                .collect(),
        );
        debug!(total, access_points = roster.len(), "device list filtered");

        if roster.is_empty() {
            return Err(CoreError::EmptyResult);
        }
        Ok(roster)
    }
}
