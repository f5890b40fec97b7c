// src/disk.rs
//
// Disk budget monitoring for traffic-gen
// Samples free space under the temp root and turns it into a backpressure verdict

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::config::DiskConfig;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Backpressure signal derived from free space. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DiskVerdict {
    #[default]
    Ok,
    /// Below the soft warning threshold: log only
    Warning,
    /// At or below the stop threshold: uploads are skipped before synthesizing
    Throttle,
    /// At or below the emergency threshold: activity drops to zero
    Emergency,
}

impl fmt::Display for DiskVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiskVerdict::Ok => "ok",
            DiskVerdict::Warning => "warning",
            DiskVerdict::Throttle => "throttle",
            DiskVerdict::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Source of free-space readings
pub trait SpaceProbe: Send + Sync {
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// Real filesystem probe (statvfs via fs2)
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSpaceProbe;

impl SpaceProbe for FsSpaceProbe {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

/// Shared free-space monitor for the temp root
pub struct DiskBudgetMonitor {
    path: PathBuf,
    config: DiskConfig,
    probe: Box<dyn SpaceProbe>,
}

impl fmt::Debug for DiskBudgetMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskBudgetMonitor")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DiskBudgetMonitor {
    pub fn new(path: impl Into<PathBuf>, config: DiskConfig) -> Self {
        Self::with_probe(path, config, Box::new(FsSpaceProbe))
    }

    pub fn with_probe(path: impl Into<PathBuf>, config: DiskConfig, probe: Box<dyn SpaceProbe>) -> Self {
        Self {
            path: path.into(),
            config,
            probe,
        }
    }

    pub fn config(&self) -> &DiskConfig {
        &self.config
    }

    /// Current free space in GB
    pub fn sample(&self) -> io::Result<f64> {
        let bytes = self.probe.available_bytes(&self.path)?;
        Ok(bytes as f64 / BYTES_PER_GB)
    }

    /// Classify a free-space reading
    pub fn verdict(&self, free_gb: f64) -> DiskVerdict {
        if free_gb <= self.config.emergency_gb {
            DiskVerdict::Emergency
        } else if free_gb <= self.config.stop_gb {
            DiskVerdict::Throttle
        } else if free_gb < self.config.warning_gb {
            DiskVerdict::Warning
        } else {
            DiskVerdict::Ok
        }
    }

    /// Fresh sample: free space at or below the stop threshold
    pub fn should_throttle(&self) -> io::Result<bool> {
        Ok(self.verdict(self.sample()?) >= DiskVerdict::Throttle)
    }

    /// Fresh sample: free space at or below the emergency threshold
    pub fn needs_emergency_halt(&self) -> io::Result<bool> {
        Ok(self.verdict(self.sample()?) == DiskVerdict::Emergency)
    }
}

/// Result of one gate check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateReading {
    pub verdict: DiskVerdict,
    pub free_gb: Option<f64>,
    /// True when this call took a real sample (counts as a disk check)
    pub sampled: bool,
}

/// Per-actor rate limiter for disk sampling.
///
/// Samples at most once per `check_interval`; between samples the previous
/// verdict is reused. A failed probe keeps the previous verdict.
pub struct DiskGate {
    monitor: Arc<DiskBudgetMonitor>,
    interval: Duration,
    last_sample: Option<Instant>,
    last_verdict: DiskVerdict,
    last_free_gb: Option<f64>,
}

impl DiskGate {
    pub fn new(monitor: Arc<DiskBudgetMonitor>) -> Self {
        let interval = monitor.config.check_interval;
        Self {
            monitor,
            interval,
            last_sample: None,
            last_verdict: DiskVerdict::Ok,
            last_free_gb: None,
        }
    }

    pub fn check(&mut self, actor_id: &str) -> GateReading {
        self.check_at(actor_id, Instant::now())
    }

    pub fn check_at(&mut self, actor_id: &str, now: Instant) -> GateReading {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.interval {
                return GateReading {
                    verdict: self.last_verdict,
                    free_gb: self.last_free_gb,
                    sampled: false,
                };
            }
        }
        self.last_sample = Some(now);

        match self.monitor.sample() {
            Ok(free_gb) => {
                let verdict = self.monitor.verdict(free_gb);
                match verdict {
                    DiskVerdict::Emergency => {
                        error!(actor = %actor_id, "EMERGENCY: only {:.1}GB free, halting activity", free_gb)
                    }
                    DiskVerdict::Throttle => {
                        warn!(actor = %actor_id, "LOW DISK SPACE: {:.1}GB free, stopping uploads", free_gb)
                    }
                    DiskVerdict::Warning => {
                        warn!(actor = %actor_id, "disk space warning: {:.1}GB free", free_gb)
                    }
                    DiskVerdict::Ok => debug!(actor = %actor_id, "disk ok: {:.1}GB free", free_gb),
                }
                self.last_verdict = verdict;
                self.last_free_gb = Some(free_gb);
            }
            Err(e) => {
                warn!(actor = %actor_id, "free space probe failed, keeping {} verdict: {}", self.last_verdict, e);
            }
        }

        GateReading {
            verdict: self.last_verdict,
            free_gb: self.last_free_gb,
            sampled: true,
        }
    }

    pub fn last_verdict(&self) -> DiskVerdict {
        self.last_verdict
    }
}
