//! End-to-end lifecycle scenarios against in-memory and on-disk storage

use crate::support::{serve, FakeSite, SCOPE};
use futures_util::future::join_all;
use precache::config::WorkerConfig;
use precache::host::Registration;
use precache::http::{Request, Response};
use precache::network::HttpNetwork;
use precache::storage::{CacheStorage, DiskStorage, MemoryStorage};
use precache::worker::{CacheManager, ResponseSource, WorkerState};
use precache::PrecacheError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn worker(cache_name: &str) -> WorkerConfig {
    WorkerConfig {
        cache_name: cache_name.to_string(),
        scope: SCOPE.to_string(),
        ..Default::default()
    }
}

fn root() -> Request {
    Request::get(SCOPE)
}

#[tokio::test]
async fn root_goes_to_network_before_install_and_cache_after() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    let mut registration = Registration::new(storage.clone(), site.clone());

    let client = registration.open_client();
    let before = registration.fetch(client, &root()).await.unwrap();
    assert_eq!(before.source, ResponseSource::Network);
    assert_eq!(site.calls(SCOPE), 1);

    registration.register(worker("v1")).await.unwrap();
    assert_eq!(site.calls(SCOPE), 2);

    let after = registration.fetch(client, &root()).await.unwrap();
    assert_eq!(after.source, ResponseSource::Cache);
    assert_eq!(after.response.body, b"page:");
    assert_eq!(site.calls(SCOPE), 2);
}

#[tokio::test]
async fn activation_replaces_old_generation() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    storage
        .put_all(
            "v0",
            vec![(
                Request::get(SCOPE).key(),
                Response::new(SCOPE, 200, b"old root".to_vec()),
            )],
        )
        .await
        .unwrap();

    let mut registration = Registration::new(storage.clone(), site.clone());
    let outcome = registration.register(worker("v1")).await.unwrap();

    assert_eq!(outcome.activation.unwrap().deleted, vec!["v0"]);
    assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
    assert_eq!(storage.entries("v1").await.unwrap().len(), 3);

    let client = registration.open_client();
    let served = registration.fetch(client, &root()).await.unwrap();
    assert_eq!(served.response.body, b"page:");
}

#[tokio::test]
async fn every_other_generation_is_removed() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    for name in ["v0", "v0.5", "other-app"] {
        storage.open(name).await.unwrap();
    }

    let mut registration = Registration::new(storage.clone(), site);
    registration.register(worker("v1")).await.unwrap();

    assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
}

#[tokio::test]
async fn reinstalling_same_generation_keeps_three_entries() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    let mut registration = Registration::new(storage.clone(), site);

    registration.register(worker("v1")).await.unwrap();
    let second = registration.register(worker("v1")).await.unwrap();

    assert_eq!(second.install.entries, 3);
    assert_eq!(storage.entries("v1").await.unwrap().len(), 3);
    assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
}

#[tokio::test]
async fn failed_update_keeps_serving_previous_version() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    let mut registration = Registration::new(storage.clone(), site.clone());
    registration.register(worker("v1")).await.unwrap();
    let client = registration.open_client();

    site.set_offline(true);
    let err = registration.register(worker("v2")).await.unwrap_err();
    assert!(matches!(err, PrecacheError::InstallFailed { .. }));

    assert_eq!(registration.active().unwrap().cache_name(), "v1");
    assert!(storage.entries("v2").await.unwrap().is_empty());

    let served = registration.fetch(client, &root()).await.unwrap();
    assert_eq!(served.source, ResponseSource::Cache);
}

#[tokio::test]
async fn offline_miss_surfaces_network_error() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    let mut registration = Registration::new(storage, site.clone());
    registration.register(worker("v1")).await.unwrap();
    let client = registration.open_client();

    site.set_offline(true);
    let hit = registration
        .fetch(client, &Request::get(format!("{}index.html", SCOPE)))
        .await
        .unwrap();
    assert_eq!(hit.source, ResponseSource::Cache);

    let err = registration
        .fetch(client, &Request::get(format!("{}app.js", SCOPE)))
        .await
        .unwrap_err();
    assert!(matches!(err, PrecacheError::Network { .. }));
}

#[tokio::test]
async fn concurrent_fetches_share_one_manager() {
    let storage = Arc::new(MemoryStorage::new());
    let site = Arc::new(FakeSite::new());
    let manager = Arc::new(CacheManager::new(worker("v1"), storage, site.clone()));
    manager.install().await.unwrap();
    manager.activate().await.unwrap();
    let installed_calls = site.total_calls();

    let requests: Vec<Request> = (0..16)
        .map(|i| {
            if i % 2 == 0 {
                Request::get(format!("{}index.html", SCOPE))
            } else {
                Request::get(format!("{}app.js", SCOPE))
            }
        })
        .collect();
    let outcomes = join_all(requests.iter().map(|r| manager.fetch(r))).await;

    let from_cache = outcomes
        .iter()
        .filter(|o| o.as_ref().unwrap().source == ResponseSource::Cache)
        .count();
    assert_eq!(from_cache, 8);
    assert_eq!(site.total_calls(), installed_calls + 8);
    assert_eq!(manager.state().await, WorkerState::Activated);
}

#[tokio::test]
async fn http_network_and_disk_storage_work_offline() {
    let temp = TempDir::new().unwrap();
    let (scope, server) = serve(3);
    let config = WorkerConfig {
        cache_name: "app-cache-v1".to_string(),
        scope: scope.clone(),
        ..Default::default()
    };

    let storage = Arc::new(DiskStorage::new(temp.path().join("caches")).await.unwrap());
    let network = Arc::new(HttpNetwork::new(Duration::from_secs(5), "precache-test"));
    let mut registration = Registration::new(storage.clone(), network.clone());
    let outcome = registration.register(config).await.unwrap();
    assert_eq!(outcome.install.entries, 3);

    tokio::task::spawn_blocking(move || server.join().unwrap())
        .await
        .unwrap();

    // A fresh registration over the same directory, as a later run would see it
    let record = registration.record().unwrap().clone();
    let reopened = Arc::new(DiskStorage::new(temp.path().join("caches")).await.unwrap());
    let mut resumed = Registration::resume(record, reopened, network);
    let client = resumed.open_client();

    let served = resumed
        .fetch(client, &Request::get(format!("{}manifest.json", scope)))
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.body, b"body of /manifest.json");
    assert_eq!(served.response.header("content-type"), Some("text/plain"));
}
