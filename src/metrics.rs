//! Shared metrics collection
//!
//! Global and per-actor counters live under one lock so that every update
//! touches both in the same critical section; a snapshot therefore always
//! satisfies `global == sum(per_actor)`. Client latencies go into HDR
//! histograms (microseconds).

use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

use hdrhistogram::{CreationError, Histogram};
use parking_lot::Mutex;

use crate::constants::{HIST_HIGH_US, HIST_LOW_US, HIST_SIGFIG};
use crate::schedule::ActionKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub operations: u64,
    pub uploads: u64,
    pub downloads: u64,
    pub errors: u64,
    pub files_created: u64,
    pub large_files_created: u64,
    pub ttl_policies_applied: u64,
    pub bytes_transferred: u64,
    pub subfolders_used: u64,
    pub disk_checks: u64,
}

impl Counters {
    fn apply(&mut self, event: CounterEvent) {
        match event {
            CounterEvent::Completed { kind, bytes } => {
                self.operations += 1;
                match kind {
                    ActionKind::Upload => self.uploads += 1,
                    ActionKind::Download => self.downloads += 1,
                }
                self.bytes_transferred += bytes;
            }
            CounterEvent::Error => self.errors += 1,
            CounterEvent::FileCreated { large } => {
                self.files_created += 1;
                if large {
                    self.large_files_created += 1;
                }
            }
            CounterEvent::TtlPolicyApplied => self.ttl_policies_applied += 1,
            CounterEvent::SubfolderUsed => self.subfolders_used += 1,
            CounterEvent::DiskCheck => self.disk_checks += 1,
        }
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, o: Self) {
        self.operations += o.operations;
        self.uploads += o.uploads;
        self.downloads += o.downloads;
        self.errors += o.errors;
        self.files_created += o.files_created;
        self.large_files_created += o.large_files_created;
        self.ttl_policies_applied += o.ttl_policies_applied;
        self.bytes_transferred += o.bytes_transferred;
        self.subfolders_used += o.subfolders_used;
        self.disk_checks += o.disk_checks;
    }
}

/// One counter update, applied to both the global and the actor totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    /// Successful upload or download
    Completed { kind: ActionKind, bytes: u64 },
    Error,
    FileCreated { large: bool },
    TtlPolicyApplied,
    SubfolderUsed,
    DiskCheck,
}

/// Percentile summary of one latency histogram (microseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencySummary {
    fn from_hist(h: &Histogram<u64>) -> Self {
        if h.is_empty() {
            return Self::default();
        }
        Self {
            count: h.len(),
            mean_us: h.mean(),
            p50_us: h.value_at_quantile(0.50),
            p95_us: h.value_at_quantile(0.95),
            p99_us: h.value_at_quantile(0.99),
            max_us: h.max(),
        }
    }
}

/// Consistent copy of all counters
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub global: Counters,
    pub per_actor: BTreeMap<String, Counters>,
    pub uptime: Duration,
    pub upload_latency: LatencySummary,
    pub download_latency: LatencySummary,
}

impl MetricsSnapshot {
    pub fn actor_total(&self) -> Counters {
        let mut sum = Counters::default();
        for c in self.per_actor.values() {
            sum += *c;
        }
        sum
    }

    pub fn ops_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.global.operations as f64 / secs
    }
}

struct Inner {
    global: Counters,
    per_actor: BTreeMap<String, Counters>,
    upload_latency: Histogram<u64>,
    download_latency: Histogram<u64>,
}

pub struct MetricsAggregator {
    inner: Mutex<Inner>,
    started: Instant,
}

impl std::fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsAggregator")
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

fn new_hist() -> Result<Histogram<u64>, CreationError> {
    Histogram::<u64>::new_with_bounds(HIST_LOW_US, HIST_HIGH_US, HIST_SIGFIG)
}

impl MetricsAggregator {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            inner: Mutex::new(Inner {
                global: Counters::default(),
                per_actor: BTreeMap::new(),
                upload_latency: new_hist()?,
                download_latency: new_hist()?,
            }),
            started: Instant::now(),
        })
    }

    /// Make an actor visible in snapshots before its first update
    pub fn register_actor(&self, actor_id: &str) {
        self.inner
            .lock()
            .per_actor
            .entry(actor_id.to_string())
            .or_default();
    }

    pub fn record(&self, actor_id: &str, event: CounterEvent) {
        let mut inner = self.inner.lock();
        inner.global.apply(event);
        inner
            .per_actor
            .entry(actor_id.to_string())
            .or_default()
            .apply(event);
    }

    /// Count a finished action: success bumps operations, the kind and
    /// bytes; failure bumps errors only.
    pub fn record_op(&self, actor_id: &str, kind: ActionKind, bytes: u64, is_error: bool) {
        let event = if is_error {
            CounterEvent::Error
        } else {
            CounterEvent::Completed { kind, bytes }
        };
        self.record(actor_id, event);
    }

    pub fn record_latency(&self, kind: ActionKind, latency: Duration) {
        let micros = (latency.as_micros() as u64).clamp(HIST_LOW_US, HIST_HIGH_US);
        let mut inner = self.inner.lock();
        let hist = match kind {
            ActionKind::Upload => &mut inner.upload_latency,
            ActionKind::Download => &mut inner.download_latency,
        };
        let _ = hist.record(micros);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        MetricsSnapshot {
            global: inner.global,
            per_actor: inner.per_actor.clone(),
            uptime: self.started.elapsed(),
            upload_latency: LatencySummary::from_hist(&inner.upload_latency),
            download_latency: LatencySummary::from_hist(&inner.download_latency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_op_success_and_failure() {
        let m = MetricsAggregator::new().unwrap();
        m.record_op("a", ActionKind::Upload, 100, false);
        m.record_op("a", ActionKind::Download, 50, false);
        m.record_op("b", ActionKind::Upload, 999, true);

        let s = m.snapshot();
        assert_eq!(s.global.operations, 2);
        assert_eq!(s.global.uploads, 1);
        assert_eq!(s.global.downloads, 1);
        assert_eq!(s.global.errors, 1);
        assert_eq!(s.global.bytes_transferred, 150);
        assert_eq!(s.per_actor["b"].errors, 1);
        assert_eq!(s.per_actor["b"].operations, 0);
    }

    #[test]
    fn test_events() {
        let m = MetricsAggregator::new().unwrap();
        m.register_actor("idle");
        m.record("a", CounterEvent::FileCreated { large: true });
        m.record("a", CounterEvent::FileCreated { large: false });
        m.record("a", CounterEvent::TtlPolicyApplied);
        m.record("a", CounterEvent::SubfolderUsed);
        m.record("a", CounterEvent::DiskCheck);

        let s = m.snapshot();
        assert_eq!(s.global.files_created, 2);
        assert_eq!(s.global.large_files_created, 1);
        assert_eq!(s.global.ttl_policies_applied, 1);
        assert_eq!(s.global.subfolders_used, 1);
        assert_eq!(s.global.disk_checks, 1);
        assert_eq!(s.per_actor["idle"], Counters::default());
        assert_eq!(s.actor_total(), s.global);
    }

    #[test]
    fn test_latency_summary() {
        let m = MetricsAggregator::new().unwrap();
        assert_eq!(m.snapshot().upload_latency.count, 0);
        for ms in 1..=100 {
            m.record_latency(ActionKind::Upload, Duration::from_millis(ms));
        }
        let s = m.snapshot();
        assert_eq!(s.upload_latency.count, 100);
        let p50 = s.upload_latency.p50_us as f64;
        assert!((49_000.0..=51_500.0).contains(&p50), "p50 {}", p50);
        assert!(s.upload_latency.p99_us >= s.upload_latency.p95_us);
        assert_eq!(s.download_latency.count, 0);
    }

    #[test]
    fn test_concurrent_updates_keep_sums_consistent() {
        let m = Arc::new(MetricsAggregator::new().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let m = Arc::clone(&m);
                std::thread::spawn(move || {
                    let id = format!("actor-{}", t);
                    for i in 0..1000u64 {
                        let kind = if i % 5 == 0 { ActionKind::Download } else { ActionKind::Upload };
                        m.record_op(&id, kind, i, i % 7 == 0);
                        if i % 3 == 0 {
                            m.record(&id, CounterEvent::DiskCheck);
                        }
                    }
                })
            })
            .collect();

        // Snapshots taken mid-flight must already be consistent
        for _ in 0..50 {
            let s = m.snapshot();
            assert_eq!(s.actor_total(), s.global);
            assert_eq!(s.global.operations, s.global.uploads + s.global.downloads);
        }
        for h in handles {
            h.join().unwrap();
        }

        let s = m.snapshot();
        assert_eq!(s.actor_total(), s.global);
        assert_eq!(s.global.operations + s.global.errors, 8000);
    }
}
