// Controller session: login negotiation and authenticated requests
//
// The login endpoint sets a session cookie in the client's jar; later
// requests carry it automatically. Each `authenticate` call starts from
// an empty jar so stale cookies from a previous dialect never leak into
// the new session.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

use crate::dialect::{Dialect, LOGIN_STRATEGIES, LoginStrategy, parse_base_url};
use crate::error::Error;
use crate::models::{DeviceListResponse, DeviceRecord};
use crate::transport::TransportConfig;

/// Controller location and login material.
///
/// Owned by the caller; the session never persists it.
#[derive(Debug, Clone)]
pub struct ControllerCredentials {
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
}

impl ControllerCredentials {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Authentication state and negotiated dialect for one controller.
///
/// Created empty. [`authenticate`](Self::authenticate) sets it; any 401/403
/// on a later call clears the `authenticated` flag until the next login.
pub struct ControllerSession {
    transport: TransportConfig,
    http: reqwest::Client,
    dialect: Dialect,
    authenticated: bool,
}

impl ControllerSession {
    pub fn new(transport: TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client(&Arc::new(Jar::default()))?;
        Ok(Self {
            transport,
            http,
            dialect: Dialect::Unknown,
            authenticated: false,
        })
    }

    /// The dialect learned by the last successful login.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Mark the session as expired. The dialect is kept.
    pub fn invalidate(&mut self) {
        self.authenticated = false;
    }

    /// Log in, trying each [`LoginStrategy`] in order.
    ///
    /// The first strategy answered with HTTP 200 decides the dialect. A
    /// malformed base URL is rejected before any request is sent. When
    /// every attempt failed at the transport level the last transport error
    /// is returned; otherwise the failure is an `Authentication` error.
    pub async fn authenticate(&mut self, credentials: &ControllerCredentials) -> Result<Dialect, Error> {
        let base = parse_base_url(&credentials.base_url)?;

        self.http = self.transport.build_client(&Arc::new(Jar::default()))?;
        self.authenticated = false;

        let mut rejections = Vec::new();
        let mut transport_failures = 0usize;
        let mut last_transport = None;

        for strategy in LOGIN_STRATEGIES {
            match self.try_login(&base, strategy, credentials).await {
                Ok(()) => {
                    self.dialect = strategy.dialect();
                    self.authenticated = true;
                    debug!(dialect = ?self.dialect, "login successful");
                    return Ok(self.dialect);
                }
                Err(Error::Transport(e)) => {
                    debug!(strategy = strategy.name(), error = %e, "login request failed");
                    rejections.push(format!("{}: {e}", strategy.name()));
                    transport_failures += 1;
                    last_transport = Some(e);
                }
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "login rejected");
                    rejections.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        warn!("all login strategies failed");
        if transport_failures == LOGIN_STRATEGIES.len() {
            if let Some(e) = last_transport {
                return Err(Error::Transport(e));
            }
        }
        Err(Error::Authentication {
            message: rejections.join("; "),
        })
    }

    async fn try_login(
        &self,
        base: &Url,
        strategy: LoginStrategy,
        credentials: &ControllerCredentials,
    ) -> Result<(), Error> {
        let url = strategy.login_url(base)?;
        debug!(strategy = strategy.name(), "logging in at {}", url);

        let body = strategy.login_body(&credentials.username, &credentials.password);
        let resp = self.http.post(url).json(&body).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Error::Authentication {
                message: format!("HTTP {status}"),
            });
        }
        Ok(())
    }

    /// Fetch the raw device list.
    ///
    /// 401/403 clears the session and returns `SessionExpired`; any other
    /// non-200 status is `InvalidResponse`; an unexpected body shape is
    /// `Deserialization`. Nothing is retried here.
    pub async fn get_devices(&mut self, url: Url) -> Result<Vec<DeviceRecord>, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate();
            return Err(Error::SessionExpired {
                status: status.as_u16(),
            });
        }

        if status != StatusCode::OK {
            return Err(Error::InvalidResponse {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let parsed: DeviceListResponse = serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        Ok(parsed.data)
    }
}
