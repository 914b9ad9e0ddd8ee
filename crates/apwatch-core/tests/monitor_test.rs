#![allow(clippy::unwrap_used)]
// Reconciliation cycles against a wiremock controller with in-memory
// collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use apwatch_core::{
    ACCOUNT_CONTROLLER_URL, ACCOUNT_PASSWORD, ACCOUNT_USERNAME, AccessPoint, ConnectionState,
    CoreError, CycleOutcome, HardwareAddress, IdentityError, LocalCache, Monitor, MonitorConfig,
    NetworkIdentity, NetworkIdentityProvider, Roster, SecretStore, StoreError,
};

// ── Fakes ───────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryStore(Mutex<HashMap<String, String>>);

impl MemoryStore {
    fn with_controller(url: &str) -> Self {
        let store = Self::default();
        store.set(ACCOUNT_CONTROLLER_URL, url).unwrap();
        store.set(ACCOUNT_USERNAME, "admin").unwrap();
        store.set(ACCOUNT_PASSWORD, "s3cret").unwrap();
        store
    }
}

impl SecretStore for MemoryStore {
    fn set(&self, account: &str, value: &str) -> Result<(), StoreError> {
        self.0.lock().unwrap().insert(account.into(), value.into());
        Ok(())
    }

    fn get(&self, account: &str) -> Result<String, StoreError> {
        self.0
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                account: account.into(),
            })
    }

    fn delete(&self, account: &str) -> Result<(), StoreError> {
        self.0.lock().unwrap().remove(account);
        Ok(())
    }
}

#[derive(Default, Clone)]
struct MemoryCache(Arc<Mutex<Option<(Roster, DateTime<Utc>)>>>);

impl LocalCache for MemoryCache {
    fn save(&self, roster: &Roster, fetched_at: DateTime<Utc>) -> Result<(), StoreError> {
        *self.0.lock().unwrap() = Some((roster.clone(), fetched_at));
        Ok(())
    }

    fn load(&self) -> Option<Roster> {
        self.0.lock().unwrap().as_ref().map(|(r, _)| r.clone())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.0.lock().unwrap().as_ref().map(|(_, t)| *t)
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.0.lock().unwrap() = None;
        Ok(())
    }
}

enum Reading {
    Associated(&'static str),
    NotAssociated,
    Denied,
}

struct FixedIdentity(Reading);

impl NetworkIdentityProvider for FixedIdentity {
    fn check_access(&self) -> Result<(), IdentityError> {
        match self.0 {
            Reading::Denied => Err(IdentityError::PermissionDenied("location services off".into())),
            _ => Ok(()),
        }
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        Ok(match self.0 {
            Reading::Associated(bssid) => Some(NetworkIdentity {
                network_name: Some("Corp".into()),
                radio_address: bssid.into(),
            }),
            _ => None,
        })
    }
}

/// Blocks inside the identity read until released.
struct GatedIdentity {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl NetworkIdentityProvider for GatedIdentity {
    fn check_access(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(None)
    }
}

/// Panics on the first identity read.
struct PanickingIdentity(Arc<Notify>);

impl NetworkIdentityProvider for PanickingIdentity {
    fn check_access(&self) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<NetworkIdentity>, IdentityError> {
        self.0.notify_one();
        panic!("identity backend crashed");
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

const OFFICE_BSSID: &str = "aa:bb:cc:dd:ee:05";

fn devices() -> serde_json::Value {
    json!({
        "meta": { "rc": "ok" },
        "data": [
            { "_id": "ap1", "mac": "aa:bb:cc:dd:ee:00", "type": "uap", "name": "Office", "model": "U6LR", "state": 1, "adopted": true },
            { "_id": "sw1", "mac": "11:22:33:44:55:66", "type": "usw", "model": "US24", "state": 1 },
            { "_id": "ap2", "mac": "ff:ee:dd:cc:bb:aa", "type": "uap", "model": "U6Lite", "state": 0 }
        ]
    })
}

fn config() -> MonitorConfig {
    MonitorConfig {
        use_local_cache: false,
        ..MonitorConfig::default()
    }
}

fn monitor(
    server: &MockServer,
    reading: Reading,
    config: MonitorConfig,
) -> Monitor<MemoryStore, MemoryCache, FixedIdentity> {
    Monitor::new(
        MemoryStore::with_controller(&server.uri()),
        MemoryCache::default(),
        FixedIdentity(reading),
        config,
    )
    .unwrap()
}

async fn mount_unifi_os(server: &MockServer, logins: u64, fetches: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(logins)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices()))
        .expect(fetches)
        .mount(server)
        .await;
}

fn completed(outcome: CycleOutcome) -> apwatch_core::MonitorSnapshot {
    match outcome {
        CycleOutcome::Completed(snapshot) => snapshot,
        CycleOutcome::Skipped => panic!("cycle was skipped"),
    }
}

// ── Cycle outcomes ──────────────────────────────────────────────────

#[tokio::test]
async fn test_cycle_is_idempotent_and_does_not_refetch() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;
    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());

    let first = completed(monitor.refresh().await);
    let second = completed(monitor.refresh().await);

    assert_eq!(first.state, ConnectionState::Connected);
    assert_eq!(second.state, ConnectionState::Connected);
    assert_eq!(first.access_point, second.access_point);
    assert_eq!(second.access_point.unwrap().name, "Office");
    assert_eq!(second.network_name.as_deref(), Some("Corp"));
    assert_eq!(second.cycles, 2);
    assert!(second.last_updated >= first.last_updated);
    assert_eq!(monitor.roster().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_radio_is_away() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;
    let monitor = monitor(&server, Reading::Associated("01:02:03:04:05:06"), config());

    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Away);
    assert!(snapshot.access_point.is_none());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_expired_session_reauthenticates_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices()))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());
    let snapshot = completed(monitor.refresh().await);

    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_second_rejection_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());
    let snapshot = completed(monitor.refresh().await);

    assert_eq!(snapshot.state, ConnectionState::Error);
    assert!(snapshot.error.unwrap().starts_with("Authentication failed"));
    assert!(monitor.roster().is_none());
}

#[tokio::test]
async fn test_legacy_controller_uses_unprefixed_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices()))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());
    let snapshot = completed(monitor.refresh().await);

    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(monitor.dialect().await, apwatch_core::Dialect::Legacy);
}

#[tokio::test]
async fn test_no_access_points_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "_id": "gw", "mac": "00:11:22:33:44:55", "type": "udm" }]
        })))
        .mount(&server)
        .await;

    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());
    let snapshot = completed(monitor.refresh().await);

    assert_eq!(snapshot.state, ConnectionState::Error);
    assert_eq!(snapshot.error.as_deref(), Some("No access points found"));
}

#[tokio::test]
async fn test_held_roster_survives_controller_outage() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;
    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());
    completed(monitor.refresh().await);

    // Controller gone; the held roster still answers.
    server.reset().await;
    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Connected);
}

// ── Early exits ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_no_association_is_disconnected_without_network_calls() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 0, 0).await;
    let monitor = monitor(&server, Reading::NotAssociated, config());

    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(snapshot.access_point.is_none());
    assert!(snapshot.radio_address.is_none());
}

#[tokio::test]
async fn test_permission_denied_is_error() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 0, 0).await;
    let monitor = monitor(&server, Reading::Denied, config());

    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Error);
    assert!(snapshot.error.unwrap().contains("location services off"));
}

#[tokio::test]
async fn test_missing_credentials_is_error() {
    let monitor = Monitor::new(
        MemoryStore::default(),
        MemoryCache::default(),
        FixedIdentity(Reading::Associated(OFFICE_BSSID)),
        config(),
    )
    .unwrap();

    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Error);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("No credentials configured: missing controller.url, controller.username, controller.password")
    );
}

// ── Forced refresh and the local cache ──────────────────────────────

#[tokio::test]
async fn test_force_refresh_fetches_again() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 2).await;
    let monitor = monitor(&server, Reading::Associated(OFFICE_BSSID), config());

    completed(monitor.refresh().await);
    let snapshot = completed(monitor.force_refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Connected);
}

fn cached_roster() -> Roster {
    Roster::new(vec![AccessPoint {
        id: "ap1".into(),
        hardware_address: HardwareAddress::new("aa:bb:cc:dd:ee:00"),
        name: "Cached".into(),
        model: "U6LR".into(),
        state_code: 1,
        adopted: true,
    }])
}

fn cached_monitor(
    server: &MockServer,
    cache: MemoryCache,
) -> Monitor<MemoryStore, MemoryCache, FixedIdentity> {
    Monitor::new(
        MemoryStore::with_controller(&server.uri()),
        cache,
        FixedIdentity(Reading::Associated(OFFICE_BSSID)),
        MonitorConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_warm_start_from_local_cache() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 0, 0).await;

    let cache = MemoryCache::default();
    cache.save(&cached_roster(), Utc::now()).unwrap();
    let monitor = cached_monitor(&server, cache);

    let snapshot = completed(monitor.refresh().await);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.access_point.unwrap().name, "Cached");
}

#[tokio::test]
async fn test_force_refresh_bypasses_local_cache_and_writes_back() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;

    let cache = MemoryCache::default();
    cache.save(&cached_roster(), Utc::now()).unwrap();
    let monitor = cached_monitor(&server, cache.clone());

    let snapshot = completed(monitor.force_refresh().await);
    assert_eq!(snapshot.access_point.unwrap().name, "Office");

    let info = monitor.cache_info().unwrap();
    assert_eq!(info.count, 2);
    assert!(info.fetched_at.is_some());
    assert_eq!(cache.load().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_and_clear_cache() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;
    let monitor = monitor(&server, Reading::NotAssociated, config());

    let info = monitor.update_cache().await.unwrap();
    assert_eq!(info.count, 2);
    assert_eq!(monitor.cache_info().unwrap().count, 2);
    assert!(monitor.roster().is_some());

    monitor.clear_cache().unwrap();
    assert!(monitor.cache_info().is_none());
    assert!(monitor.roster().is_none());
}

#[tokio::test]
async fn test_connection_check_leaves_loop_state_alone() {
    let server = MockServer::start().await;
    mount_unifi_os(&server, 1, 1).await;
    let monitor = monitor(&server, Reading::NotAssociated, config());

    let credentials = apwatch_core::ControllerCredentials::new(server.uri(), "admin", "s3cret");
    let (dialect, roster) = monitor.test_connection(&credentials).await.unwrap();

    assert_eq!(dialect, apwatch_core::Dialect::UnifiOs);
    assert_eq!(roster.len(), 2);
    assert!(monitor.roster().is_none());
    assert!(monitor.cache_info().is_none());
}

#[tokio::test]
async fn test_connection_check_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let monitor = monitor(&server, Reading::NotAssociated, config());

    let credentials = apwatch_core::ControllerCredentials::new(server.uri(), "admin", "wrong");
    let err = monitor.test_connection(&credentials).await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_trigger_is_dropped() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let monitor = Monitor::new(
        MemoryStore::default(),
        MemoryCache::default(),
        GatedIdentity {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        },
        config(),
    )
    .unwrap();

    let background = monitor.clone();
    let first = tokio::spawn(async move { background.refresh().await });

    entered.notified().await;
    assert_eq!(monitor.refresh().await, CycleOutcome::Skipped);

    release.notify_one();
    let snapshot = completed(first.await.unwrap());
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert_eq!(snapshot.cycles, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_runs_first_cycle_immediately_and_stops() {
    let monitor = Monitor::new(
        MemoryStore::default(),
        MemoryCache::default(),
        FixedIdentity(Reading::NotAssociated),
        config(),
    )
    .unwrap();
    let mut updates = monitor.subscribe();

    monitor.start().await;
    assert!(monitor.is_running().await);
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow().state, ConnectionState::Disconnected);

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow().cycles, 2);

    monitor.stop().await;
    assert!(!monitor.is_running().await);
}

#[tokio::test]
async fn test_stop_survives_panicked_timer_task() {
    let entered = Arc::new(Notify::new());
    let monitor = Monitor::new(
        MemoryStore::default(),
        MemoryCache::default(),
        PanickingIdentity(Arc::clone(&entered)),
        config(),
    )
    .unwrap();

    monitor.start().await;
    entered.notified().await;

    monitor.stop().await;
    assert!(!monitor.is_running().await);
    assert_eq!(monitor.snapshot().cycles, 0);
}
