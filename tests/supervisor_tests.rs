// Integration tests for the supervisor lifecycle
//
// Full runs against the in-process backend: metrics consistency, shutdown
// cleanup, lock exclusivity and startup failures.
//
// Run with: cargo test --test supervisor_tests -- --nocapture

mod common;

use std::time::{Duration, Instant};

use tempfile::TempDir;

use common::{fast_config, FakeClient, StaticProbe};
use traffic_gen::cleanup;
use traffic_gen::error::LockError;
use traffic_gen::lock::ProcessLock;
use traffic_gen::registry::OperationRegistry;
use traffic_gen::Supervisor;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_run_metrics_are_consistent() {
    let tmp = TempDir::new().unwrap();
    let config = fast_config(tmp.path());
    let root = config.temp_root.clone();
    let lock_path = config.lock_path.clone();
    let client = FakeClient::new();

    let summary = Supervisor::with_client(config, client.clone())
        .with_space_probe(Box::new(StaticProbe::gb(500.0)))
        .run_until(std::future::pending())
        .await
        .unwrap();

    assert!(summary.startup_complete);
    assert!(summary.stop_reason.contains("elapsed"), "reason: {}", summary.stop_reason);

    let snap = &summary.snapshot;
    let g = snap.global;
    assert_eq!(g, snap.actor_total(), "global counters must equal the per-actor sum");
    assert_eq!(g.operations, g.uploads + g.downloads);
    assert!(g.uploads > 0, "expected some uploads in a 2s run");
    assert!(g.bytes_transferred > 0);
    assert_eq!(g.errors, 0);
    assert!(g.files_created >= g.uploads);
    assert_eq!(g.ttl_policies_applied, g.uploads);
    assert!(g.subfolders_used >= 1);
    assert!(g.disk_checks >= 2);
    assert_eq!(snap.upload_latency.count, g.uploads);
    assert_eq!(snap.download_latency.count, g.downloads);

    // Both buckets exist remotely, and every upload landed
    assert!(client.has_bucket("alice-bucket"));
    assert!(client.has_bucket("shared-bucket"));
    let stored = client.object_count("alice-bucket") + client.object_count("shared-bucket");
    assert_eq!(stored as u64, g.uploads);

    assert_eq!(summary.actors.len(), 2);
    assert!(summary.unacknowledged.is_empty());
    assert!(summary.actors.iter().all(|a| a.drained));

    assert!(summary.final_cleanup.root_removed);
    assert!(!root.exists(), "temp root should be gone after shutdown");
    assert!(!lock_path.exists(), "lock file should be released");
    assert!(summary.final_report.contains("FINAL"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_external_stop_ends_run_early() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.duration = Duration::from_secs(600);
    let client = FakeClient::new();

    let started = Instant::now();
    let summary = Supervisor::with_client(config, client)
        .with_space_probe(Box::new(StaticProbe::gb(500.0)))
        .run_until(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "test stop"
        })
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, "test stop");
    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(summary.unacknowledged.is_empty());
}

#[tokio::test]
async fn test_held_lock_prevents_start() {
    let tmp = TempDir::new().unwrap();
    let config = fast_config(tmp.path());
    let root = config.temp_root.clone();
    let _held = ProcessLock::acquire(&config.lock_path).unwrap();

    let err = Supervisor::with_client(config, FakeClient::new())
        .run_until(std::future::pending())
        .await
        .unwrap_err();

    match err.downcast_ref::<LockError>() {
        Some(LockError::Held { holder, .. }) => assert_eq!(*holder, Some(std::process::id())),
        other => panic!("expected LockError::Held, got {:?}", other),
    }
    assert!(!root.exists(), "no temp root may be created without the lock");
}

#[tokio::test]
async fn test_missing_client_binary_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.client.binary = tmp.path().join("no-such-client");
    let root = config.temp_root.clone();
    let lock_path = config.lock_path.clone();

    let err = Supervisor::new(config).run_until(std::future::pending()).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "{:#}", err);
    assert!(!root.exists());
    assert!(!lock_path.exists(), "lock must be released on startup failure");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_uploads_count_errors_and_leave_nothing_behind() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.traffic.upload_ratio = 1.0;
    let root = config.temp_root.clone();
    let client = FakeClient::new();
    client.set_fail_uploads(true);

    let summary = Supervisor::with_client(config, client.clone())
        .with_space_probe(Box::new(StaticProbe::gb(500.0)))
        .run_until(std::future::pending())
        .await
        .unwrap();

    let g = summary.snapshot.global;
    assert!(g.errors > 0);
    assert_eq!(g.uploads, 0);
    assert_eq!(g.operations, 0);
    assert_eq!(g.bytes_transferred, 0);
    assert!(g.files_created >= g.errors);
    assert_eq!(client.object_count("alice-bucket"), 0);
    assert!(!root.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_emergency_disk_halts_activity() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.duration = Duration::from_secs(1);

    let summary = Supervisor::with_client(config, FakeClient::new())
        .with_space_probe(Box::new(StaticProbe::gb(1.0)))
        .run_until(std::future::pending())
        .await
        .unwrap();

    let g = summary.snapshot.global;
    assert_eq!(g.operations, 0);
    assert_eq!(g.errors, 0);
    assert_eq!(g.files_created, 0);
    assert!(g.disk_checks > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_low_disk_throttles_uploads_without_errors() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.duration = Duration::from_secs(1);
    config.traffic.upload_ratio = 1.0;
    let client = FakeClient::new();

    let summary = Supervisor::with_client(config, client.clone())
        .with_space_probe(Box::new(StaticProbe::gb(8.0)))
        .run_until(std::future::pending())
        .await
        .unwrap();

    let g = summary.snapshot.global;
    assert_eq!(g.errors, 0, "a throttled disk is not a failure");
    assert_eq!(g.operations, 0);
    assert_eq!(g.files_created, 0);
    assert!(g.disk_checks > 0);
    assert_eq!(client.calls_with("cp"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_upload_outlives_stop_timeout_and_keeps_its_file() {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    config.duration = Duration::from_secs(600);
    config.traffic.upload_ratio = 1.0;
    config.shutdown.actor_stop_timeout = Duration::from_millis(200);
    config.shutdown.drain_timeout = Duration::from_millis(100);
    config.shutdown.grace_period = Duration::ZERO;
    let root = config.temp_root.clone();
    let client = FakeClient::new();
    client.set_upload_delay(Duration::from_secs(3));

    let summary = Supervisor::with_client(config, client.clone())
        .with_space_probe(Box::new(StaticProbe::gb(500.0)))
        .run_until(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            "test stop"
        })
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, "test stop");
    assert!(!summary.unacknowledged.is_empty(), "uploads should still be running");
    assert!(
        summary.final_cleanup.protected_files >= 1,
        "in-flight upload must survive the final sweep: {:?}",
        summary.final_cleanup
    );
    assert!(!summary.final_cleanup.root_removed);
    assert!(root.exists());

    // Detached actors finish their uploads and drop their records
    tokio::time::sleep(Duration::from_secs(4)).await;
    let uploaded = client.object_count("alice-bucket") + client.object_count("shared-bucket");
    assert!(uploaded >= 1, "late uploads should still land");

    let late = cleanup::sweep(&root, &OperationRegistry::new());
    assert!(late.root_removed, "{:?}", late);
    assert!(!root.exists());
}
