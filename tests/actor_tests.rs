// Integration tests for single actor actions
//
// Drives one actor directly (no supervisor) against the in-process backend
// to check each action's metrics and local file lifecycle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use common::{fast_config, FakeClient, StaticProbe};
use traffic_gen::actor::{Actor, ActionOutcome, SharedState, SkipReason};
use traffic_gen::buckets::BucketRegistry;
use traffic_gen::cleanup;
use traffic_gen::config::GeneratorConfig;
use traffic_gen::credentials::{AWS_CONFIG_FILE, AWS_CREDENTIALS_FILE};
use traffic_gen::disk::DiskBudgetMonitor;
use traffic_gen::error::ActionError;
use traffic_gen::metrics::MetricsAggregator;
use traffic_gen::registry::{OperationKind, OperationRegistry};
use traffic_gen::schedule::ActionKind;
use traffic_gen::shutdown::{Rendezvous, ShutdownSignal};

struct Harness {
    _tmp: TempDir,
    shared: SharedState,
    client: Arc<FakeClient>,
    probe: StaticProbe,
}

fn harness(tweak: impl FnOnce(&mut GeneratorConfig)) -> Harness {
    let tmp = TempDir::new().unwrap();
    let mut config = fast_config(tmp.path());
    tweak(&mut config);
    std::fs::create_dir_all(&config.temp_root).unwrap();

    let client = FakeClient::new();
    let probe = StaticProbe::gb(500.0);
    let disk = DiskBudgetMonitor::with_probe(&config.temp_root, config.disk.clone(), Box::new(probe.clone()));
    let shared = SharedState {
        config: Arc::new(config),
        registry: Arc::new(OperationRegistry::new()),
        buckets: Arc::new(BucketRegistry::new()),
        metrics: Arc::new(MetricsAggregator::new().unwrap()),
        disk: Arc::new(disk),
        client: client.clone(),
        shutdown: ShutdownSignal::new(),
        rendezvous: Arc::new(Rendezvous::new(1)),
    };
    Harness {
        _tmp: tmp,
        shared,
        client,
        probe,
    }
}

async fn actor(h: &Harness, index: usize) -> Actor {
    let profile = h.shared.config.actors[index].clone();
    h.shared.metrics.register_actor(&profile.id);
    let mut actor = Actor::with_rng(profile, h.shared.clone(), StdRng::seed_from_u64(42)).unwrap();
    actor.setup().await.unwrap();
    actor
}

fn local_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[tokio::test]
async fn test_setup_creates_bucket_once_and_writes_delivery_files() {
    let h = harness(|_| {});
    let bob = actor(&h, 1).await;

    assert!(h.client.has_bucket("shared-bucket"));
    assert_eq!(h.client.calls_with("mb"), 1);
    assert!(bob.dir().join(AWS_CREDENTIALS_FILE).is_file());
    assert!(bob.dir().join(AWS_CONFIG_FILE).is_file());

    // Second actor on the same bucket: no second create
    let mut again = h.shared.config.actors[1].clone();
    again.id = "bob2".into();
    let mut second = Actor::new(again, h.shared.clone()).unwrap();
    second.setup().await.unwrap();
    assert_eq!(h.client.calls_with("mb"), 1);
    assert_eq!(h.shared.buckets.creation_attempts(), 1);
}

#[tokio::test]
async fn test_upload_success_updates_metrics_and_removes_artifact() {
    let h = harness(|_| {});
    let mut alice = actor(&h, 0).await;

    let outcome = alice.perform_action(ActionKind::Upload).await;
    let bytes = match outcome {
        ActionOutcome::Succeeded { kind, bytes } => {
            assert_eq!(kind, ActionKind::Upload);
            bytes
        }
        other => panic!("expected success, got {:?}", other),
    };
    assert!((64..=8192).contains(&bytes));
    assert_eq!(alice.uploads_done(), 1);
    assert_eq!(h.client.object_count("alice-bucket"), 1);

    let snap = h.shared.metrics.snapshot();
    let c = snap.per_actor["alice"];
    assert_eq!(c.operations, 1);
    assert_eq!(c.uploads, 1);
    assert_eq!(c.bytes_transferred, bytes);
    assert_eq!(c.files_created, 1);
    assert_eq!(c.ttl_policies_applied, 1);
    assert_eq!(c.subfolders_used, 1);
    assert_eq!(snap.global, snap.actor_total());

    assert!(local_files(alice.dir()).is_empty(), "artifact must be deleted after upload");
    assert!(h.shared.registry.is_empty());
}

#[tokio::test]
async fn test_download_reports_local_size_and_cleans_up() {
    let h = harness(|_| {});
    let mut alice = actor(&h, 0).await;
    h.client.put_object("alice-bucket", "projects/atlas/src/report.txt", 4321);

    match alice.perform_action(ActionKind::Download).await {
        ActionOutcome::Succeeded { kind, bytes } => {
            assert_eq!(kind, ActionKind::Download);
            assert_eq!(bytes, 4321);
        }
        other => panic!("expected success, got {:?}", other),
    }

    let c = h.shared.metrics.snapshot().per_actor["alice"];
    assert_eq!(c.downloads, 1);
    assert_eq!(c.operations, 1);
    assert_eq!(c.bytes_transferred, 4321);
    assert!(local_files(alice.dir()).is_empty());
}

#[tokio::test]
async fn test_download_from_empty_bucket_is_skipped() {
    let h = harness(|_| {});
    let mut alice = actor(&h, 0).await;

    match alice.perform_action(ActionKind::Download).await {
        ActionOutcome::Skipped { reason, .. } => assert_eq!(reason, SkipReason::EmptyListing),
        other => panic!("expected skip, got {:?}", other),
    }
    let c = h.shared.metrics.snapshot().per_actor["alice"];
    assert_eq!(c.operations, 0);
    assert_eq!(c.errors, 0);
}

#[tokio::test]
async fn test_low_disk_skips_upload_without_counting_an_error() {
    let h = harness(|_| {});
    h.probe.set_gb(7.0);
    let mut alice = actor(&h, 0).await;

    for _ in 0..3 {
        match alice.perform_action(ActionKind::Upload).await {
            ActionOutcome::Skipped { kind, reason } => {
                assert_eq!(kind, ActionKind::Upload);
                assert_eq!(reason, SkipReason::DiskThrottled);
            }
            other => panic!("expected disk throttle skip, got {:?}", other),
        }
    }
    let c = h.shared.metrics.snapshot().per_actor["alice"];
    assert_eq!(c.errors, 0);
    assert_eq!(c.operations, 0);
    assert_eq!(c.files_created, 0);
    assert_eq!(h.client.calls_with("cp"), 0);
    assert!(local_files(alice.dir()).is_empty());
}

#[tokio::test]
async fn test_upload_target_stops_uploads() {
    let h = harness(|c| c.high_volume.target_files_per_bucket = 1);
    let mut alice = actor(&h, 0).await;

    assert!(matches!(
        alice.perform_action(ActionKind::Upload).await,
        ActionOutcome::Succeeded { .. }
    ));
    match alice.perform_action(ActionKind::Upload).await {
        ActionOutcome::Skipped { reason, .. } => assert_eq!(reason, SkipReason::TargetReached),
        other => panic!("expected skip, got {:?}", other),
    }
    assert_eq!(h.client.object_count("alice-bucket"), 1);
}

#[tokio::test]
async fn test_failed_upload_counts_error_and_deletes_artifact() {
    let h = harness(|_| {});
    h.client.set_fail_uploads(true);
    let mut alice = actor(&h, 0).await;

    let outcome = alice.perform_action(ActionKind::Upload).await;
    assert!(outcome.is_failure());
    match outcome {
        ActionOutcome::Failed {
            error: ActionError::Command(e),
            ..
        } => assert!(!e.is_timeout()),
        other => panic!("expected command failure, got {:?}", other),
    }

    let c = h.shared.metrics.snapshot().per_actor["alice"];
    assert_eq!(c.errors, 1);
    assert_eq!(c.uploads, 0);
    assert_eq!(c.files_created, 1);
    assert!(local_files(alice.dir()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sweep_spares_in_flight_upload() {
    let h = harness(|_| {});
    h.client.set_upload_delay(Duration::from_millis(800));
    let mut alice = actor(&h, 0).await;
    let root = h.shared.config.temp_root.clone();
    let registry = Arc::clone(&h.shared.registry);

    let task = tokio::spawn(async move {
        let outcome = alice.perform_action(ActionKind::Upload).await;
        (alice, outcome)
    });

    // Wait until the synthesized file is on disk and held by the upload
    let uploading = |reg: &OperationRegistry| {
        reg.records()
            .iter()
            .any(|r| r.kind == OperationKind::Upload && r.path.exists())
    };
    let mut waited = Duration::ZERO;
    while !uploading(&registry) {
        assert!(waited < Duration::from_secs(5), "upload never registered");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    let first = {
        let _hold = registry.hold();
        cleanup::sweep(&root, &registry)
    };
    assert_eq!(first.protected_files, 1);
    assert!(!first.root_removed);

    let (_alice, outcome) = task.await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Succeeded { .. }), "{:?}", outcome);

    let second = cleanup::sweep(&root, &registry);
    assert!(second.root_removed);
    assert!(!root.exists());
}
