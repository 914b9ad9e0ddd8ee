// ── Reconciliation loop ──
//
// One cycle: identity -> credentials -> roster -> match -> derived state.
// The session and the held roster belong to the loop; everyone else sees
// published MonitorSnapshots only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use apwatch_api::{ControllerCredentials, ControllerSession, Dialect, TransportConfig};

use crate::credentials::{load_credentials, missing_accounts};
use crate::directory::DeviceDirectory;
use crate::error::CoreError;
use crate::matcher::match_access_point;
use crate::model::{AccessPoint, ConnectionState, NetworkIdentity, Roster};
use crate::ports::{IdentityError, LocalCache, NetworkIdentityProvider, SecretStore};
use crate::state::{IdentityReading, Observation, derive_state};

// ── Configuration ────────────────────────────────────────────────

/// Runtime tuning for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Timer period. Zero disables the background task.
    pub refresh_interval: Duration,
    pub transport: TransportConfig,
    pub site: String,
    /// Adopt the [`LocalCache`] roster when none is held, and write fresh
    /// fetches back to it.
    pub use_local_cache: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            transport: TransportConfig::default(),
            site: "default".into(),
            use_local_cache: true,
        }
    }
}

// ── Published state ──────────────────────────────────────────────

/// Result of the most recent completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub state: ConnectionState,
    pub network_name: Option<String>,
    pub radio_address: Option<String>,
    pub access_point: Option<AccessPoint>,
    pub error: Option<String>,
    /// Never moves backwards, even if the wall clock does.
    pub last_updated: Option<DateTime<Utc>>,
    pub cycles: u64,
}

/// What a trigger did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(MonitorSnapshot),
    /// Another cycle was in flight; this trigger was dropped.
    Skipped,
}

impl CycleOutcome {
    pub fn snapshot(&self) -> Option<&MonitorSnapshot> {
        match self {
            Self::Completed(snapshot) => Some(snapshot),
            Self::Skipped => None,
        }
    }
}

/// Contents of the [`LocalCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

// ── Busy guard ───────────────────────────────────────────────────

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Monitor ──────────────────────────────────────────────────────

/// The reconciliation loop.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Cycles run on demand
/// ([`refresh`](Self::refresh)) or on the timer started by
/// [`start`](Self::start); at most one runs at a time.
pub struct Monitor<S, C, N> {
    inner: Arc<MonitorInner<S, C, N>>,
}

impl<S, C, N> Clone for Monitor<S, C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<S, C, N> {
    config: MonitorConfig,
    secrets: S,
    cache: C,
    identity: N,
    directory: DeviceDirectory,
    session: Mutex<ControllerSession>,
    roster: ArcSwapOption<Roster>,
    busy: AtomicBool,
    /// Set by a forced refresh; cleared once a network fetch succeeds.
    bypass_cache: AtomicBool,
    snapshot: watch::Sender<MonitorSnapshot>,
    timer: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl<S, C, N> Monitor<S, C, N>
where
    S: SecretStore + 'static,
    C: LocalCache + 'static,
    N: NetworkIdentityProvider + 'static,
{
    pub fn new(secrets: S, cache: C, identity: N, config: MonitorConfig) -> Result<Self, CoreError> {
        let session = ControllerSession::new(config.transport.clone())?;
        let (snapshot, _) = watch::channel(MonitorSnapshot::default());

        Ok(Self {
            inner: Arc::new(MonitorInner {
                directory: DeviceDirectory::new(config.site.clone()),
                config,
                secrets,
                cache,
                identity,
                session: Mutex::new(session),
                roster: ArcSwapOption::empty(),
                busy: AtomicBool::new(false),
                bypass_cache: AtomicBool::new(false),
                snapshot,
                timer: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn secrets(&self) -> &S {
        &self.inner.secrets
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// The roster held in memory, if any.
    pub fn roster(&self) -> Option<Arc<Roster>> {
        self.inner.roster.load_full()
    }

    pub async fn dialect(&self) -> Dialect {
        self.inner.session.lock().await.dialect()
    }

    // ── Cycles ───────────────────────────────────────────────────

    /// Run one cycle unless one is already in flight.
    pub async fn refresh(&self) -> CycleOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.inner.busy) else {
            debug!("cycle already in flight, trigger dropped");
            return CycleOutcome::Skipped;
        };
        CycleOutcome::Completed(self.run_cycle().await)
    }

    /// Discard the held roster, then run a cycle that fetches from the
    /// controller. The local cache is not consulted until that fetch
    /// succeeds.
    pub async fn force_refresh(&self) -> CycleOutcome {
        self.inner.roster.store(None);
        self.inner.bypass_cache.store(true, Ordering::Release);
        info!("held roster discarded");
        self.refresh().await
    }

    async fn run_cycle(&self) -> MonitorSnapshot {
        let (observation, failure) = self.observe().await;
        let state = derive_state(&observation);

        let previous = self.snapshot();
        let now = Utc::now();
        let identity = observation.network_identity();
        let snapshot = MonitorSnapshot {
            state,
            network_name: identity.and_then(|i| i.network_name.clone()),
            radio_address: identity.map(|i| i.radio_address.clone()),
            access_point: observation.matched.clone(),
            error: failure.as_ref().map(ToString::to_string),
            last_updated: Some(previous.last_updated.map_or(now, |p| p.max(now))),
            cycles: previous.cycles + 1,
        };

        match failure {
            Some(ref e) if e.is_transient() => info!(error = %e, "cycle failed, will retry next cycle"),
            Some(ref e) => warn!(error = %e, "cycle failed"),
            None => {}
        }
        if previous.state == snapshot.state {
            debug!(state = %snapshot.state, "cycle complete");
        } else {
            info!(from = %previous.state, to = %snapshot.state, "connection state changed");
        }

        self.inner.snapshot.send_replace(snapshot.clone());
        snapshot
    }

    /// Walk the cycle until it completes or something stops it.
    async fn observe(&self) -> (Observation, Option<CoreError>) {
        let identity = match self.read_identity().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return (Observation::new(IdentityReading::Absent), None),
            Err((reading, e)) => return (Observation::new(reading), Some(e)),
        };
        let radio_address = identity.radio_address.clone();
        let mut observation = Observation::new(IdentityReading::Present(identity));

        let credentials = match self.stored_credentials() {
            Ok(credentials) => credentials,
            Err(e) => return (observation, Some(e)),
        };
        observation.credentials_present = true;

        let roster = match self.ensure_roster(&credentials).await {
            Ok(roster) => roster,
            Err(e) => return (observation, Some(e)),
        };
        observation.roster_available = true;
        observation.matched = match_access_point(&radio_address, &roster).cloned();

        (observation, None)
    }

    async fn read_identity(
        &self,
    ) -> Result<Option<NetworkIdentity>, (IdentityReading, CoreError)> {
        let provider = &self.inner.identity;
        provider
            .check_access()
            .map_err(|e| (IdentityReading::Denied, e.into()))?;

        match provider.current_identity().await {
            Ok(Some(identity)) if identity.radio_address.trim().is_empty() => Ok(None),
            Ok(identity) => Ok(identity),
            Err(e @ IdentityError::PermissionDenied(_)) => Err((IdentityReading::Denied, e.into())),
            Err(e) => Err((IdentityReading::Failed, e.into())),
        }
    }

    fn stored_credentials(&self) -> Result<ControllerCredentials, CoreError> {
        if let Some(credentials) = load_credentials(&self.inner.secrets)? {
            return Ok(credentials);
        }
        let missing = missing_accounts(&self.inner.secrets)?;
        Err(CoreError::ConfigurationMissing {
            message: format!("missing {}", missing.join(", ")),
        })
    }

    /// The held roster, else the local cache, else a network fetch.
    async fn ensure_roster(
        &self,
        credentials: &ControllerCredentials,
    ) -> Result<Arc<Roster>, CoreError> {
        if let Some(roster) = self.inner.roster.load_full() {
            return Ok(roster);
        }

        if self.inner.config.use_local_cache && !self.inner.bypass_cache.load(Ordering::Acquire) {
            if let Some(cached) = self.inner.cache.load().filter(|r| !r.is_empty()) {
                info!(access_points = cached.len(), "roster loaded from local cache");
                let roster = Arc::new(cached);
                self.inner.roster.store(Some(Arc::clone(&roster)));
                return Ok(roster);
            }
        }

        let roster = Arc::new(self.fetch_roster(credentials).await?);
        self.inner.bypass_cache.store(false, Ordering::Release);
        self.inner.roster.store(Some(Arc::clone(&roster)));

        if self.inner.config.use_local_cache {
            if let Err(e) = self.inner.cache.save(&roster, Utc::now()) {
                warn!(error = %e, "failed to write roster to local cache");
            }
        }
        Ok(roster)
    }

    /// Authenticate if needed, then fetch through the directory.
    async fn fetch_roster(&self, credentials: &ControllerCredentials) -> Result<Roster, CoreError> {
        let mut session = self.inner.session.lock().await;
        if !session.is_authenticated() {
            let dialect = session.authenticate(credentials).await?;
            info!(?dialect, "authenticated with controller");
        }
        let roster = self.inner.directory.fetch_roster(&mut session, credentials).await?;
        info!(access_points = roster.len(), "roster fetched from controller");
        Ok(roster)
    }

    // ── Cache and connection management ──────────────────────────

    /// Fetch fresh from the controller and persist to the local cache.
    pub async fn update_cache(&self) -> Result<CacheInfo, CoreError> {
        let credentials = self.stored_credentials()?;
        let roster = Arc::new(self.fetch_roster(&credentials).await?);
        let fetched_at = Utc::now();
        self.inner.cache.save(&roster, fetched_at)?;

        self.inner.bypass_cache.store(false, Ordering::Release);
        self.inner.roster.store(Some(Arc::clone(&roster)));
        Ok(CacheInfo {
            count: roster.len(),
            fetched_at: Some(fetched_at),
        })
    }

    /// `None` when the local cache holds nothing.
    pub fn cache_info(&self) -> Option<CacheInfo> {
        let roster = self.inner.cache.load()?;
        Some(CacheInfo {
            count: roster.len(),
            fetched_at: self.inner.cache.timestamp(),
        })
    }

    /// Empty the local cache and drop the held roster.
    pub fn clear_cache(&self) -> Result<(), CoreError> {
        self.inner.cache.clear()?;
        self.inner.roster.store(None);
        info!("roster cache cleared");
        Ok(())
    }

    /// Log in and fetch with `credentials` on a throwaway session.
    ///
    /// Leaves the loop's session, held roster and local cache untouched.
    pub async fn test_connection(
        &self,
        credentials: &ControllerCredentials,
    ) -> Result<(Dialect, Roster), CoreError> {
        let mut session = ControllerSession::new(self.inner.config.transport.clone())?;
        let dialect = session.authenticate(credentials).await?;
        let roster = self.inner.directory.fetch_roster(&mut session, credentials).await?;
        Ok((dialect, roster))
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the timer task: one cycle now, then one per period. A no-op if
    /// already running or if the period is zero.
    pub async fn start(&self) {
        let mut timer = self.inner.timer.lock().await;
        if timer.is_some() {
            return;
        }
        let period = self.inner.config.refresh_interval;
        if period.is_zero() {
            warn!("refresh interval is zero, timer not started");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresh_task(self.clone(), period, cancel.clone()));
        *timer = Some((handle, cancel));
        info!(period_secs = period.as_secs(), "monitor started");
    }

    /// Cancel the timer task and wait for it. An in-flight cycle finishes
    /// first.
    pub async fn stop(&self) {
        let Some((handle, cancel)) = self.inner.timer.lock().await.take() else {
            return;
        };
        cancel.cancel();
        if let Err(e) = handle.await {
            warn!(error = %e, "refresh task ended abnormally");
        }
        info!("monitor stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner.timer.lock().await.is_some()
    }
}

async fn refresh_task<S, C, N>(monitor: Monitor<S, C, N>, period: Duration, cancel: CancellationToken)
where
    S: SecretStore + 'static,
    C: LocalCache + 'static,
    N: NetworkIdentityProvider + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if monitor.refresh().await == CycleOutcome::Skipped {
                    debug!("timer tick skipped, cycle in flight");
                }
            }
        }
    }
}
