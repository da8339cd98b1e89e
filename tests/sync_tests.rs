//! Integration tests for the sync engine against an in-memory directory.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use akv::cache::{CacheSnapshot, CacheStore};
use akv::client::{DirectoryClient, FailureMode, MemoryClient};
use akv::errors::AkvError;
use akv::sync::{SyncEngine, FULL_SYNC_WORKERS};
use tempfile::TempDir;

/// Helper: a cache store inside a fresh temp dir.
fn store() -> (TempDir, CacheStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = CacheStore::new(dir.path().join("akv_cache.json"));
    (dir, store)
}

fn engine<'a>(client: &Arc<MemoryClient>, store: &'a CacheStore) -> SyncEngine<'a> {
    SyncEngine::new(Arc::clone(client) as Arc<dyn DirectoryClient>, store)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Names-only sync
// ---------------------------------------------------------------------------

#[test]
fn names_only_records_every_vault_as_unknown() {
    let (_dir, store) = store();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("kv-b", &[("s", "v")])
            .with_vault("kv-a", &[]),
    );

    let snap = engine(&client, &store).names_only().unwrap();

    assert_eq!(snap.vault_names().collect::<Vec<_>>(), vec!["kv-a", "kv-b"]);
    assert_eq!(snap.entry("kv-b"), Some(&None));
    assert_eq!(
        fs::read_to_string(store.path()).unwrap(),
        "{\n  \"kv-a\": null,\n  \"kv-b\": null\n}\n"
    );
    assert_eq!(client.list_secrets_calls(), 0);
}

#[test]
fn names_only_with_zero_vaults_keeps_existing_cache() {
    let (_dir, store) = store();
    let mut existing = CacheSnapshot::new();
    existing.insert("kv-old", Some(names(&["s1"])));
    store.save(&existing).unwrap();
    let before = fs::read(store.path()).unwrap();

    let client = Arc::new(MemoryClient::new());
    let err = engine(&client, &store).names_only().unwrap_err();

    assert!(matches!(err, AkvError::NoVaults));
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn names_only_listing_failure_is_fatal_and_writes_nothing() {
    let (_dir, store) = store();
    let client = Arc::new(MemoryClient::new().with_vault("kv", &[]));
    client.fail_listing(Some(FailureMode::Connectivity));

    let err = engine(&client, &store).names_only().unwrap_err();
    assert!(matches!(err, AkvError::Connectivity(_)));
    assert!(!store.exists());
}

#[test]
fn load_runs_names_only_sync_when_cache_is_missing() {
    let (_dir, store) = store();
    let client = Arc::new(MemoryClient::new().with_vault("kv-a", &[("s", "v")]));

    let snap = engine(&client, &store).load().unwrap();
    assert_eq!(snap.entry("kv-a"), Some(&None));
    assert!(store.exists());
}

#[test]
fn load_surfaces_corrupt_cache() {
    let (_dir, store) = store();
    fs::write(store.path(), "{oops").unwrap();
    let client = Arc::new(MemoryClient::new().with_vault("kv-a", &[]));

    let err = engine(&client, &store).load().unwrap_err();
    assert!(matches!(err, AkvError::InvalidCacheFormat { .. }));
}

// ---------------------------------------------------------------------------
// Full sync
// ---------------------------------------------------------------------------

#[test]
fn full_sync_fetches_every_vault() {
    let (_dir, store) = store();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("v1", &[("s2", "b"), ("s1", "a")])
            .with_vault("v2", &[]),
    );

    let report = engine(&client, &store).full(|_| {}).unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.snapshot.entry("v1"), Some(&Some(names(&["s1", "s2"]))));
    assert_eq!(report.snapshot.entry("v2"), Some(&Some(vec![])));
    assert_eq!(store.read().unwrap().unwrap(), report.snapshot);
}

#[test]
fn full_sync_degrades_failing_vault_to_unknown() {
    let (_dir, store) = store();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("v1", &[("s1", "a")])
            .with_vault("v2", &[("s9", "z")]),
    );
    client.fail_vault("v2", FailureMode::Connectivity);

    let report = engine(&client, &store).full(|_| {}).unwrap();

    assert_eq!(report.snapshot.entry("v1"), Some(&Some(names(&["s1"]))));
    assert_eq!(report.snapshot.entry("v2"), Some(&None));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].vault, "v2");
    assert!(matches!(report.failures[0].error, AkvError::Connectivity(_)));
}

#[test]
fn full_sync_survives_service_and_missing_vault_errors() {
    let (_dir, store) = store();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("a", &[("x", "1")])
            .with_vault("b", &[])
            .with_vault("c", &[]),
    );
    client.fail_vault("b", FailureMode::Service);
    client.fail_vault("c", FailureMode::VaultNotFound);

    let report = engine(&client, &store).full(|_| {}).unwrap();
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.snapshot.len(), 3);
}

#[test]
fn full_sync_fails_only_when_listing_fails() {
    let (_dir, store) = store();
    let client = Arc::new(MemoryClient::new().with_vault("v1", &[]));
    client.fail_listing(Some(FailureMode::Service));

    let err = engine(&client, &store).full(|_| {}).unwrap_err();
    assert!(matches!(err, AkvError::Service(_)));
    assert!(!store.exists());
}

#[test]
fn full_sync_is_byte_identical_when_remote_is_unchanged() {
    let (_dir, store) = store();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("kv-b", &[("z", "1"), ("a", "2")])
            .with_vault("kv-a", &[("m", "3")])
            .with_vault("kv-c", &[]),
    );
    let sync = engine(&client, &store);

    sync.full(|_| {}).unwrap();
    let first = fs::read(store.path()).unwrap();
    sync.full(|_| {}).unwrap();
    let second = fs::read(store.path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn full_sync_reports_progress_for_every_vault() {
    let (_dir, store) = store();
    let mut client = MemoryClient::new();
    for i in 0..15 {
        client = client.with_vault(&format!("kv-{i:02}"), &[]);
    }
    let client = Arc::new(client);

    let mut seen = Vec::new();
    engine(&client, &store)
        .full(|p| seen.push((p.completed, p.total, p.vault.to_string())))
        .unwrap();

    assert_eq!(seen.len(), 15);
    let counts: Vec<usize> = seen.iter().map(|(c, _, _)| *c).collect();
    assert_eq!(counts, (1..=15).collect::<Vec<_>>());
    assert!(seen.iter().all(|(_, total, _)| *total == 15));

    let mut vaults: Vec<String> = seen.into_iter().map(|(_, _, v)| v).collect();
    vaults.sort();
    vaults.dedup();
    assert_eq!(vaults.len(), 15);
}

#[test]
fn full_sync_reports_progress_in_completion_order() {
    let (_dir, store) = store();
    // Vaults listed first answer slowest.
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("kv-0", &[("a", "1")])
            .with_vault("kv-1", &[])
            .with_vault("kv-2", &[])
            .with_vault("kv-3", &[("b", "2")])
            .with_vault_latency("kv-0", Duration::from_millis(450))
            .with_vault_latency("kv-1", Duration::from_millis(300))
            .with_vault_latency("kv-2", Duration::from_millis(150))
            .with_vault_latency("kv-3", Duration::ZERO),
    );

    let mut order = Vec::new();
    let report = engine(&client, &store)
        .full(|p| order.push(p.vault.to_string()))
        .unwrap();

    assert_eq!(order, vec!["kv-3", "kv-2", "kv-1", "kv-0"]);
    assert_eq!(
        report.snapshot.vault_names().collect::<Vec<_>>(),
        vec!["kv-0", "kv-1", "kv-2", "kv-3"]
    );
    assert_eq!(report.snapshot.entry("kv-0"), Some(&Some(names(&["a"]))));
}

#[test]
fn full_sync_progress_marks_failures() {
    let (_dir, store) = store();
    let client = Arc::new(MemoryClient::new().with_vault("ok", &[]).with_vault("bad", &[]));
    client.fail_vault("bad", FailureMode::Service);

    let mut failed = Vec::new();
    engine(&client, &store)
        .full(|p| {
            if !p.ok {
                failed.push(p.vault.to_string());
            }
        })
        .unwrap();

    assert_eq!(failed, vec!["bad"]);
}

#[test]
fn full_sync_respects_worker_bound() {
    let (_dir, store) = store();
    let mut client = MemoryClient::new().with_latency(Duration::from_millis(20));
    for i in 0..35 {
        client = client.with_vault(&format!("kv-{i:02}"), &[]);
    }
    let client = Arc::new(client);

    engine(&client, &store).full(|_| {}).unwrap();

    assert_eq!(client.list_secrets_calls(), 35);
    assert!(client.peak_in_flight() <= FULL_SYNC_WORKERS);
    assert!(client.peak_in_flight() > 1);
}

#[test]
fn full_sync_reports_vault_set_changes() {
    let (_dir, store) = store();
    store
        .save(&CacheSnapshot::from_vault_names(["kv-gone", "kv-kept"]))
        .unwrap();
    let client = Arc::new(
        MemoryClient::new()
            .with_vault("kv-kept", &[])
            .with_vault("kv-new", &[]),
    );

    let report = engine(&client, &store).full(|_| {}).unwrap();
    assert_eq!(report.added, vec!["kv-new"]);
    assert_eq!(report.removed, vec!["kv-gone"]);
}

#[test]
fn full_sync_overwrites_corrupt_cache() {
    let (_dir, store) = store();
    fs::write(store.path(), "not json").unwrap();
    let client = Arc::new(MemoryClient::new().with_vault("kv", &[("s", "v")]));

    let report = engine(&client, &store).full(|_| {}).unwrap();
    assert_eq!(report.added, vec!["kv"]);
    assert!(store.read().is_ok());
}

// ---------------------------------------------------------------------------
// Single-vault sync
// ---------------------------------------------------------------------------

#[test]
fn single_vault_sync_leaves_other_vaults_untouched() {
    let (_dir, store) = store();
    let mut cache = CacheSnapshot::new();
    cache.insert("v1", Some(names(&["s1", "s2"])));
    cache.insert("v2", Some(vec![]));
    store.save(&cache).unwrap();

    let client = Arc::new(MemoryClient::new().with_vault("v1", &[("s3", "x")]));
    let snap = engine(&client, &store).single_vault("v1").unwrap();

    assert_eq!(snap.entry("v1"), Some(&Some(names(&["s3"]))));
    assert_eq!(snap.entry("v2"), Some(&Some(vec![])));
    assert_eq!(store.read().unwrap().unwrap(), snap);
}

#[test]
fn single_vault_sync_reads_latest_cache_after_fetch() {
    let (_dir, store) = store();
    store.save(&CacheSnapshot::from_vault_names(["v1"])).unwrap();

    // Another invocation adds v9 after our engine was built.
    let client = Arc::new(MemoryClient::new().with_vault("v1", &[("s", "x")]));
    let sync = engine(&client, &store);
    let mut newer = CacheSnapshot::from_vault_names(["v1"]);
    newer.insert("v9", Some(names(&["t"])));
    store.save(&newer).unwrap();

    let snap = sync.single_vault("v1").unwrap();
    assert_eq!(snap.entry("v9"), Some(&Some(names(&["t"]))));
}

#[test]
fn single_vault_sync_failure_is_fatal() {
    let (_dir, store) = store();
    store.save(&CacheSnapshot::from_vault_names(["v1"])).unwrap();
    let before = fs::read(store.path()).unwrap();

    let client = Arc::new(MemoryClient::new().with_vault("v1", &[]));
    client.fail_vault("v1", FailureMode::Connectivity);

    let err = engine(&client, &store).single_vault("v1").unwrap_err();
    assert!(matches!(err, AkvError::Connectivity(_)));
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn single_vault_sync_of_missing_vault_is_fatal() {
    let (_dir, store) = store();
    store.save(&CacheSnapshot::from_vault_names(["v1"])).unwrap();
    let client = Arc::new(MemoryClient::new().with_vault("v1", &[]));

    let err = engine(&client, &store).single_vault("nope").unwrap_err();
    assert!(matches!(err, AkvError::VaultNotFound(_)));
}
