//! Generator supervisor
//!
//! Owns the process lock and every piece of shared state, starts one task
//! per actor plus a reporter, and runs the shutdown sequence:
//!
//! 1. set the shutdown flag
//! 2. join each actor with its own timeout (log, never abort)
//! 3. grace period
//! 4. final report
//! 5. registry-gated sweep of the temp root
//! 6. empty directories removed bottom-up, root last
//!
//! The lock is released when the supervisor returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use crate::actor::{Actor, ActorExit, SharedState};
use crate::buckets::BucketRegistry;
use crate::cleanup::{self, CleanupReport};
use crate::client::{ProcessClient, StorageClient};
use crate::config::GeneratorConfig;
use crate::disk::{DiskBudgetMonitor, SpaceProbe};
use crate::lock::ProcessLock;
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::registry::OperationRegistry;
use crate::report::{self, ReportContext};
use crate::shutdown::{Rendezvous, ShutdownSignal, StopAck};

/// Outcome of one generator run
#[derive(Debug)]
pub struct RunSummary {
    pub stop_reason: String,
    pub startup_complete: bool,
    pub snapshot: MetricsSnapshot,
    pub actors: Vec<ActorExit>,
    /// Actors whose stop acknowledgement never arrived
    pub unacknowledged: Vec<String>,
    pub final_cleanup: CleanupReport,
    pub final_report: String,
}

pub struct Supervisor {
    config: Arc<GeneratorConfig>,
    client: Arc<dyn StorageClient>,
    space_probe: Option<Box<dyn SpaceProbe>>,
    require_client_binary: bool,
}

impl Supervisor {
    /// Supervisor driving the configured client binary
    pub fn new(config: GeneratorConfig) -> Self {
        let client = Arc::new(ProcessClient::new(config.client.binary.clone()));
        Self {
            config: Arc::new(config),
            client,
            space_probe: None,
            require_client_binary: true,
        }
    }

    /// Supervisor driving an arbitrary client implementation
    pub fn with_client(config: GeneratorConfig, client: Arc<dyn StorageClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            space_probe: None,
            require_client_binary: false,
        }
    }

    pub fn with_space_probe(mut self, probe: Box<dyn SpaceProbe>) -> Self {
        self.space_probe = Some(probe);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run until the configured duration elapses or SIGINT/SIGTERM arrives.
    pub async fn run(self) -> Result<RunSummary> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
        let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        self.run_until(async move {
            tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            }
        })
        .await
    }

    /// Run until the duration elapses or `stop` resolves.
    pub async fn run_until<F>(self, stop: F) -> Result<RunSummary>
    where
        F: Future<Output = &'static str>,
    {
        let config = Arc::clone(&self.config);

        // Nothing may exist on disk before we own the lock
        let mut lock = ProcessLock::acquire(&config.lock_path)?;

        if self.require_client_binary && !config.client.binary.exists() {
            bail!("storage client binary not found at {}", config.client.binary.display());
        }
        tokio::fs::create_dir_all(&config.temp_root)
            .await
            .with_context(|| format!("failed to create temp root {}", config.temp_root.display()))?;

        let disk = match self.space_probe {
            Some(probe) => DiskBudgetMonitor::with_probe(&config.temp_root, config.disk.clone(), probe),
            None => DiskBudgetMonitor::new(&config.temp_root, config.disk.clone()),
        };
        let shared = SharedState {
            config: Arc::clone(&config),
            registry: Arc::new(OperationRegistry::new()),
            buckets: Arc::new(BucketRegistry::new()),
            metrics: Arc::new(MetricsAggregator::new().context("failed to allocate latency histograms")?),
            disk: Arc::new(disk),
            client: Arc::clone(&self.client),
            shutdown: ShutdownSignal::new(),
            rendezvous: Arc::new(Rendezvous::new(config.actors.len())),
        };

        let mut actors = Vec::with_capacity(config.actors.len());
        for profile in &config.actors {
            shared.metrics.register_actor(&profile.id);
            actors.push(Actor::new(profile.clone(), shared.clone())?);
        }

        info!(
            actors = actors.len(),
            duration = ?config.duration,
            root = %config.temp_root.display(),
            "starting traffic generator"
        );

        let mut handles: Vec<(String, StopAck, JoinHandle<ActorExit>)> = Vec::with_capacity(actors.len());
        for actor in actors {
            let id = actor.id().to_string();
            let ack = actor.stop_ack();
            let span = info_span!("actor", id = %id);
            handles.push((id, ack, tokio::spawn(actor.run().instrument(span))));
        }

        tokio::pin!(stop);

        let mut early_stop = None;
        let startup_complete = tokio::select! {
            all = shared.rendezvous.wait_all(config.startup_timeout) => all,
            reason = &mut stop => {
                early_stop = Some(reason);
                false
            }
        };
        if startup_complete {
            info!("all actors ready");
        }

        let reporter = spawn_reporter(shared.clone());

        let stop_reason = match early_stop {
            Some(r) => r.to_string(),
            None => wait_for_stop(&config, &mut stop).await,
        };
        info!("stopping: {}", stop_reason);

        // 1. flag
        shared.shutdown.trigger();

        // 2. join actors, each bounded
        let mut exits = Vec::with_capacity(handles.len());
        let mut unacknowledged = Vec::new();
        for (id, ack, handle) in handles {
            match tokio::time::timeout(config.shutdown.actor_stop_timeout, handle).await {
                Ok(Ok(exit)) => exits.push(exit),
                Ok(Err(e)) => error!(actor = %id, "actor task failed: {}", e),
                Err(_) => warn!(actor = %id, "actor did not stop within {:?}", config.shutdown.actor_stop_timeout),
            }
            if !ack.is_acknowledged() {
                unacknowledged.push(id);
            }
        }
        if let Err(e) = reporter.await {
            warn!("reporter task failed: {}", e);
        }

        // 3. grace
        tokio::time::sleep(config.shutdown.grace_period).await;

        // 4. final report
        let final_report = render_report(&shared, "FINAL TRAFFIC GENERATOR STATISTICS");
        println!("{}", final_report);
        let snapshot = shared.metrics.snapshot();

        // 5 + 6. sweep the root while holding the registry
        let root = config.temp_root.clone();
        let registry = Arc::clone(&shared.registry);
        let final_cleanup = tokio::task::spawn_blocking(move || {
            let _hold = registry.hold();
            cleanup::sweep(&root, &registry)
        })
        .await
        .context("final cleanup task failed")?;

        info!(
            removed_files = final_cleanup.removed_files,
            protected_files = final_cleanup.protected_files,
            removed_dirs = final_cleanup.removed_dirs,
            root_removed = final_cleanup.root_removed,
            "final cleanup complete"
        );

        lock.release();

        Ok(RunSummary {
            stop_reason,
            startup_complete,
            snapshot,
            actors: exits,
            unacknowledged,
            final_cleanup,
            final_report,
        })
    }
}

async fn wait_for_stop<F>(config: &GeneratorConfig, stop: &mut std::pin::Pin<&mut F>) -> String
where
    F: Future<Output = &'static str>,
{
    let deadline = Instant::now() + config.duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return format!("run duration {:?} elapsed", config.duration);
        }
        let nap = config.check_interval.min(deadline - now);
        tokio::select! {
            reason = stop.as_mut() => return reason.to_string(),
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

fn render_report(shared: &SharedState, title: &str) -> String {
    let snapshot = shared.metrics.snapshot();
    let free_gb = shared.disk.sample().ok();
    let verdict = free_gb.map(|gb| shared.disk.verdict(gb)).unwrap_or_default();
    let ctx = ReportContext {
        free_gb,
        verdict,
        target_files_per_bucket: shared.config.high_volume.target_files_per_bucket,
        actors: &shared.config.actors,
        title,
    };
    report::render(&snapshot, &ctx)
}

fn spawn_reporter(shared: SharedState) -> JoinHandle<()> {
    let interval = shared.config.report_interval;
    tokio::spawn(
        async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let text = render_report(&shared, "TRAFFIC GENERATOR STATISTICS");
                        info!("\n{}", text);
                    }
                    _ = shared.shutdown.wait() => break,
                }
            }
        }
        .instrument(info_span!("reporter")),
    )
}
