//! One simulated user.
//!
//! An actor owns `<temp root>/<actor id>`, its own RNG, disk gate and
//! subfolder counts. Everything it shares with other actors arrives through
//! [`SharedState`]. Per-action failures are counted and logged here and never
//! end the loop.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::buckets::BucketRegistry;
use crate::cleanup::{self, CleanupReport};
use crate::client::{object_key, parse_listing, s3_uri, sanitize_key, ClientEnv, StorageClient};
use crate::config::{ActorProfile, DeliveryMode, GeneratorConfig};
use crate::credentials;
use crate::disk::{DiskBudgetMonitor, DiskGate, DiskVerdict, GateReading};
use crate::error::{ActionError, DrainTimeout};
use crate::metrics::{CounterEvent, MetricsAggregator};
use crate::registry::{OperationKind, OperationRegistry};
use crate::schedule::{ActionKind, ActivitySchedule};
use crate::shutdown::{Rendezvous, ShutdownSignal, StopAck};
use crate::size_generator::FileSelector;
use crate::subfolder::SubfolderPlanner;
use crate::synth::{self, object_name, Author, RetentionClass};

/// State handed to every actor by the supervisor
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<GeneratorConfig>,
    pub registry: Arc<OperationRegistry>,
    pub buckets: Arc<BucketRegistry>,
    pub metrics: Arc<MetricsAggregator>,
    pub disk: Arc<DiskBudgetMonitor>,
    pub client: Arc<dyn StorageClient>,
    pub shutdown: ShutdownSignal,
    pub rendezvous: Arc<Rendezvous>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorPhase {
    Starting,
    Running,
    Draining,
    Stopped,
}

impl ActorPhase {
    pub fn can_transition(from: ActorPhase, to: ActorPhase) -> bool {
        use ActorPhase::*;
        matches!(
            (from, to),
            (Starting, Running)
                | (Starting, Draining) // shutdown during setup
                | (Running, Draining)
                | (Draining, Stopped)
        )
    }
}

impl fmt::Display for ActorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TargetReached,
    /// Free space at or below the stop threshold
    DiskThrottled,
    EmptyListing,
    NothingToGenerate,
}

/// Result of one action attempt
#[derive(Debug)]
pub enum ActionOutcome {
    Succeeded { kind: ActionKind, bytes: u64 },
    Skipped { kind: ActionKind, reason: SkipReason },
    Failed { kind: ActionKind, error: ActionError },
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }
}

/// What an actor reports when its task ends
#[derive(Debug, Clone)]
pub struct ActorExit {
    pub actor_id: String,
    pub drained: bool,
    pub cleanup: CleanupReport,
}

pub struct Actor {
    profile: ActorProfile,
    shared: SharedState,
    dir: PathBuf,
    env: ClientEnv,
    author: Author,
    schedule: ActivitySchedule,
    selector: FileSelector,
    subfolders: SubfolderPlanner,
    disk_gate: DiskGate,
    phase: ActorPhase,
    stop_ack: StopAck,
    uploads_done: u64,
    seq: u64,
    rng: StdRng,
}

impl Actor {
    pub fn new(profile: ActorProfile, shared: SharedState) -> Result<Self> {
        Self::with_rng(profile, shared, StdRng::from_os_rng())
    }

    pub fn with_rng(profile: ActorProfile, shared: SharedState, rng: StdRng) -> Result<Self> {
        let config = &shared.config;
        let dir = config.temp_root.join(&profile.id);
        let selector = FileSelector::new(
            &profile.file_preferences,
            &config.file_types,
            config.high_volume.small_file_bias,
        )
        .with_context(|| format!("actor {}: invalid file preferences", profile.id))?;

        let schedule = ActivitySchedule {
            window: profile.peak_hours,
            tz_offset_hours: profile.tz_offset_hours,
            multiplier: profile.activity_multiplier,
            peak_band: config.traffic.peak_ops_per_minute,
            off_peak_band: config.traffic.off_peak_ops_per_minute,
            upload_ratio: config.traffic.upload_ratio,
        };

        Ok(Self {
            env: credentials::client_env(profile.delivery, &config.client, &dir),
            author: Author {
                id: profile.id.clone(),
                description: profile.description.clone(),
            },
            subfolders: SubfolderPlanner::new(&profile.subfolder_templates, config.high_volume.files_per_subfolder),
            disk_gate: DiskGate::new(Arc::clone(&shared.disk)),
            schedule,
            selector,
            dir,
            profile,
            shared,
            phase: ActorPhase::Starting,
            stop_ack: StopAck::new(),
            uploads_done: 0,
            seq: 0,
            rng,
        })
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn phase(&self) -> ActorPhase {
        self.phase
    }

    pub fn uploads_done(&self) -> u64 {
        self.uploads_done
    }

    pub fn stop_ack(&self) -> StopAck {
        self.stop_ack.clone()
    }

    fn transition_to(&mut self, next: ActorPhase, reason: &str) {
        if self.phase == next {
            return;
        }
        if !ActorPhase::can_transition(self.phase, next) {
            warn!(actor = %self.profile.id, "invalid phase transition {} -> {} ({})", self.phase, next, reason);
            return;
        }
        debug!(actor = %self.profile.id, "{} -> {} ({})", self.phase, next, reason);
        self.phase = next;
    }

    /// Full lifecycle: setup, rendezvous, loop, drain.
    pub async fn run(mut self) -> ActorExit {
        info!(
            actor = %self.profile.id,
            delivery = %self.profile.delivery,
            bucket = %self.profile.bucket,
            "starting: {}",
            self.profile.description
        );

        if let Err(e) = self.setup().await {
            warn!(actor = %self.profile.id, "setup incomplete: {:#}", e);
        }
        let shutdown = self.shared.shutdown.clone();
        self.shared.rendezvous.arrive(&shutdown).await;

        if shutdown.is_set() {
            self.transition_to(ActorPhase::Draining, "shutdown during setup");
        } else {
            self.transition_to(ActorPhase::Running, "rendezvous released");
            self.run_loop().await;
            self.transition_to(ActorPhase::Draining, "shutdown requested");
        }

        self.drain().await
    }

    /// Create the actor directory, write delivery files and make sure the
    /// bucket exists.
    pub async fn setup(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        if self.profile.delivery == DeliveryMode::Files {
            credentials::write_config_files(&self.dir, &self.profile.id, &self.shared.config.client).await?;
        }

        let client = Arc::clone(&self.shared.client);
        let bucket = self.profile.bucket.clone();
        let list_timeout = self.shared.config.client.list_timeout;
        let probe_args = vec!["ls".to_string(), s3_uri(&bucket, None)];
        let create_args = vec!["mb".to_string(), format!("s3://{}", bucket)];
        let env = &self.env;

        self.shared
            .buckets
            .ensure_exists(
                &bucket,
                || async { client.execute(&probe_args, env, list_timeout).await.is_ok() },
                || async { client.execute(&create_args, env, list_timeout).await.map(|_| ()) },
            )
            .await;
        Ok(())
    }

    async fn run_loop(&mut self) {
        let shutdown = self.shared.shutdown.clone();
        while !shutdown.is_set() {
            let reading = self.check_disk();
            let plan = self.schedule.plan(Utc::now(), reading.verdict, &mut self.rng);

            match plan.action {
                Some(kind) => {
                    let outcome = self.perform(kind, &reading).await;
                    debug!(
                        actor = %self.profile.id,
                        activity = plan.activity,
                        peak = plan.in_peak,
                        "{:?}",
                        outcome
                    );
                }
                None => debug!(actor = %self.profile.id, "activity 0 (disk {}), idling", reading.verdict),
            }

            if !shutdown.sleep(plan.interval).await {
                break;
            }
        }
    }

    fn check_disk(&mut self) -> GateReading {
        let reading = self.disk_gate.check(&self.profile.id);
        if reading.sampled {
            self.shared.metrics.record(&self.profile.id, CounterEvent::DiskCheck);
        }
        reading
    }

    /// Sample the disk gate and perform one action of `kind`.
    pub async fn perform_action(&mut self, kind: ActionKind) -> ActionOutcome {
        let reading = self.check_disk();
        self.perform(kind, &reading).await
    }

    async fn perform(&mut self, kind: ActionKind, reading: &GateReading) -> ActionOutcome {
        let result = match kind {
            ActionKind::Upload => self.upload(reading).await,
            ActionKind::Download => self.download().await,
        };

        let id = self.profile.id.as_str();
        match result {
            Ok(Ok(bytes)) => {
                self.shared.metrics.record_op(id, kind, bytes, false);
                ActionOutcome::Succeeded { kind, bytes }
            }
            Ok(Err(reason)) => {
                debug!(actor = %id, "{} skipped: {:?}", kind, reason);
                ActionOutcome::Skipped { kind, reason }
            }
            Err(error) => {
                self.shared.metrics.record_op(id, kind, 0, true);
                warn!(actor = %id, "{} failed: {}", kind, error_chain(&error));
                ActionOutcome::Failed { kind, error }
            }
        }
    }

    async fn upload(&mut self, reading: &GateReading) -> Result<Result<u64, SkipReason>, ActionError> {
        let target = self.shared.config.high_volume.target_files_per_bucket;
        if self.uploads_done >= target {
            return Ok(Err(SkipReason::TargetReached));
        }
        if reading.verdict >= DiskVerdict::Throttle {
            debug!(
                actor = %self.profile.id,
                free_gb = reading.free_gb.unwrap_or(0.0),
                "upload held back by disk budget"
            );
            return Ok(Err(SkipReason::DiskThrottled));
        }

        let Some(choice) = self.selector.select(&mut self.rng) else {
            return Ok(Err(SkipReason::NothingToGenerate));
        };
        let now = Utc::now();
        let subfolder = self
            .shared
            .config
            .high_volume
            .subfolders_enabled
            .then(|| self.subfolders.choose(now, &mut self.rng));

        let name = object_name(&self.profile.id, choice.file_type, now.timestamp(), self.seq, &choice.extension);
        self.seq += 1;
        let path = self.dir.join(&name);

        let registry = Arc::clone(&self.shared.registry);
        let metrics = Arc::clone(&self.shared.metrics);
        let client = Arc::clone(&self.shared.client);
        let config = Arc::clone(&self.shared.config);
        let id = self.profile.id.as_str();

        let generate = registry.register(&path, OperationKind::Generate, id);
        let artifact = synth::synthesize(choice.file_type, choice.size, &self.dir, &name, &self.author).await?;
        let threshold = config.retention.large_file_threshold;
        let class = artifact.retention(threshold);
        metrics.record(
            id,
            CounterEvent::FileCreated {
                large: class == RetentionClass::Large,
            },
        );

        // Hand the path from generate to upload without a gap
        let upload = registry.register(&path, OperationKind::Upload, id);
        drop(generate);

        let key = object_key(subfolder.as_deref(), &name);
        let args = vec![
            "cp".to_string(),
            path.display().to_string(),
            s3_uri(&self.profile.bucket, Some(&key)),
        ];
        let started = Instant::now();
        let result = client.execute(&args, &self.env, config.client.upload_timeout).await;
        let latency = started.elapsed();

        drop(upload);
        if let Err(e) = Arc::clone(&registry).discard(path.clone()).await {
            debug!(actor = %id, path = %path.display(), "local artifact cleanup failed: {}", e);
        }
        result?;

        metrics.record_latency(ActionKind::Upload, latency);
        self.uploads_done += 1;
        if let Some(sf) = subfolder.as_deref() {
            if self.subfolders.record_upload(sf) {
                metrics.record(id, CounterEvent::SubfolderUsed);
            }
        }

        let ttl = match class {
            RetentionClass::Large => config.retention.large_ttl,
            RetentionClass::Regular => config.retention.regular_ttl,
        };
        info!(
            actor = %id,
            key = %key,
            size = artifact.size_bytes,
            retention = %class,
            ttl_minutes = ttl.as_secs() / 60,
            "uploaded {} ({})",
            artifact.file_name,
            artifact.file_type
        );
        metrics.record(id, CounterEvent::TtlPolicyApplied);

        Ok(Ok(artifact.size_bytes))
    }

    async fn download(&mut self) -> Result<Result<u64, SkipReason>, ActionError> {
        let client = Arc::clone(&self.shared.client);
        let registry = Arc::clone(&self.shared.registry);
        let config = Arc::clone(&self.shared.config);
        let bucket = self.profile.bucket.as_str();
        let id = self.profile.id.as_str();

        let list_args = vec![
            "ls".to_string(),
            "--long".to_string(),
            "--recursive".to_string(),
            s3_uri(bucket, None),
        ];
        let listing = client.execute(&list_args, &self.env, config.client.list_timeout).await?;
        let keys = parse_listing(&listing.stdout, bucket);
        let Some(key) = keys.choose(&mut self.rng) else {
            return Ok(Err(SkipReason::EmptyListing));
        };

        let local = self.dir.join(format!("downloaded_{}", sanitize_key(key)));
        let guard = registry.register(&local, OperationKind::Download, id);
        let args = vec![
            "cp".to_string(),
            s3_uri(bucket, Some(key)),
            local.display().to_string(),
        ];
        let started = Instant::now();
        let result = client.execute(&args, &self.env, config.client.upload_timeout).await;
        let latency = started.elapsed();

        let size = match result {
            Ok(_) => tokio::fs::metadata(&local)
                .await
                .map(|m| m.len())
                .map_err(|source| ActionError::Io {
                    path: local.clone(),
                    source,
                }),
            Err(e) => Err(ActionError::from(e)),
        };

        drop(guard);
        if let Err(e) = Arc::clone(&registry).discard(local.clone()).await {
            debug!(actor = %id, path = %local.display(), "downloaded file cleanup failed: {}", e);
        }

        let bytes = size?;
        self.shared.metrics.record_latency(ActionKind::Download, latency);
        info!(actor = %id, key = %key, bytes, "downloaded");
        Ok(Ok(bytes))
    }

    /// Wait for in-flight work, clean the actor directory, acknowledge stop.
    async fn drain(mut self) -> ActorExit {
        let id = self.profile.id.clone();
        let registry = Arc::clone(&self.shared.registry);
        let timeout = self.shared.config.shutdown.drain_timeout;

        let drained = registry.await_drained(&id, timeout).await;
        if !drained {
            let err = DrainTimeout {
                actor_id: id.clone(),
                remaining: registry.active_for(&id).len(),
                timeout,
            };
            warn!(actor = %id, "{}, cleaning up anyway", err);
        }

        let dir = self.dir.clone();
        let sweep_registry = Arc::clone(&registry);
        let cleanup = tokio::task::spawn_blocking(move || cleanup::sweep(&dir, &sweep_registry))
            .await
            .unwrap_or_else(|e| {
                warn!(actor = %id, "cleanup task failed: {}", e);
                CleanupReport::default()
            });

        self.transition_to(ActorPhase::Stopped, "drained");
        self.stop_ack.acknowledge();
        info!(
            actor = %id,
            removed = cleanup.removed_files,
            protected = cleanup.protected_files,
            uploads = self.uploads_done,
            "stopped"
        );

        ActorExit {
            actor_id: id,
            drained,
            cleanup,
        }
    }
}

/// `outer: cause: root cause`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_includes_source() {
        let err = ActionError::Io {
            path: PathBuf::from("/tmp/x"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        };
        assert_eq!(error_chain(&err), "local io failure on /tmp/x: disk on fire");
    }

    #[test]
    fn test_phase_transitions() {
        use ActorPhase::*;
        assert!(ActorPhase::can_transition(Starting, Running));
        assert!(ActorPhase::can_transition(Starting, Draining));
        assert!(ActorPhase::can_transition(Running, Draining));
        assert!(ActorPhase::can_transition(Draining, Stopped));

        assert!(!ActorPhase::can_transition(Stopped, Running));
        assert!(!ActorPhase::can_transition(Running, Starting));
        assert!(!ActorPhase::can_transition(Draining, Running));
        assert!(!ActorPhase::can_transition(Starting, Stopped));
    }
}
