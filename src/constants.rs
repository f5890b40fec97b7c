// src/constants.rs
//
// Central location for all constants used throughout traffic-gen
// Every default that a config file can override lives here

use std::time::Duration;

// =============================================================================
// Process & Filesystem Layout
// =============================================================================

/// Shared temp root; each actor writes only inside `<root>/<actor id>`
pub const DEFAULT_TEMP_ROOT: &str = "/tmp/obsctl-traffic";

/// Well-known advisory lock path (one generator per host)
pub const DEFAULT_LOCK_PATH: &str = "/tmp/obsctl-traffic-generator.lock";

/// Storage client executable
pub const DEFAULT_CLIENT_BINARY: &str = "../target/release/obsctl";

/// S3-compatible endpoint handed to the storage client
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9000";

/// OTLP collector endpoint handed to the storage client
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Loki endpoint written into on-disk client config
pub const DEFAULT_LOKI_ENDPOINT: &str = "http://localhost:3100";

pub const DEFAULT_ACCESS_KEY: &str = "minioadmin";
pub const DEFAULT_SECRET_KEY: &str = "minioadmin123";
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// Run Timing
// =============================================================================

/// Total run time (12 hours)
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(12 * 3600);

/// How often the supervisor re-checks the run deadline
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic report interval (5 minutes)
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(300);

/// Upper bound on waiting for every actor to reach the startup rendezvous
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(120);

// =============================================================================
// Shutdown
// =============================================================================

/// Per-actor wait for its own registry entries to clear
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-actor wait for its task to finish during shutdown
pub const DEFAULT_ACTOR_STOP_TIMEOUT: Duration = Duration::from_secs(45);

/// Pause between actor joins and the final sweep
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Poll period for `OperationRegistry::await_drained`
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Largest single sleep increment inside an actor wait
pub const MAX_SLEEP_INCREMENT: Duration = Duration::from_secs(1);

// =============================================================================
// External Command Timeouts
// =============================================================================

/// `cp` uploads and downloads
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// `ls` and `mb`
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Traffic Volume (operations per minute)
// =============================================================================

pub const PEAK_VOLUME_MIN: f64 = 100.0;
pub const PEAK_VOLUME_MAX: f64 = 500.0;
pub const OFF_PEAK_VOLUME_MIN: f64 = 10.0;
pub const OFF_PEAK_VOLUME_MAX: f64 = 50.0;

/// Activity factor applied inside the peak window
pub const PEAK_ACTIVITY_FACTOR: f64 = 2.5;

/// Activity factor applied outside the peak window
pub const OFF_PEAK_ACTIVITY_FACTOR: f64 = 0.5;

/// Activity above this selects the peak ops/min band
pub const PEAK_BAND_ACTIVITY: f64 = 1.0;

/// Interval jitter: uniform in [1 - J, 1 + J] x base
pub const INTERVAL_JITTER: f64 = 0.5;

/// Fraction of actions that are uploads
pub const DEFAULT_UPLOAD_RATIO: f64 = 0.8;

// =============================================================================
// Retention Classification
// =============================================================================

/// Files strictly larger than this are `large` (100 MiB)
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Retention for regular files (3 hours)
pub const REGULAR_FILE_TTL: Duration = Duration::from_secs(3 * 3600);

/// Retention for large files (60 minutes)
pub const LARGE_FILE_TTL: Duration = Duration::from_secs(60 * 60);

// =============================================================================
// High-Volume Population
// =============================================================================

/// Uploads per actor after which uploads are skipped
pub const DEFAULT_TARGET_FILES_PER_BUCKET: u64 = 50_000;

/// Boost applied to the smallest size range weight: w * (1 + bias)
pub const DEFAULT_SMALL_FILE_BIAS: f64 = 0.8;

/// Objects per generated subfolder before a new one is drawn
pub const DEFAULT_FILES_PER_SUBFOLDER: u64 = 500;

/// Attempts to find a subfolder that is under its cap
pub const SUBFOLDER_RETRY_ATTEMPTS: usize = 3;

// =============================================================================
// Disk Budget (GB = 1024^3 bytes)
// =============================================================================

pub const DEFAULT_DISK_WARNING_GB: f64 = 20.0;
pub const DEFAULT_DISK_STOP_GB: f64 = 10.0;
pub const DEFAULT_DISK_EMERGENCY_GB: f64 = 5.0;

/// Minimum time between two free-space samples by the same actor
pub const DEFAULT_DISK_CHECK_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// Synthesis & Metrics
// =============================================================================

/// Write chunk for binary artifacts
pub const SYNTH_CHUNK_SIZE: usize = 8192;

/// Latency histogram bounds (microseconds): 1 us to 1 hour, 3 sig figs
pub const HIST_LOW_US: u64 = 1;
pub const HIST_HIGH_US: u64 = 3_600_000_000;
pub const HIST_SIGFIG: u8 = 3;

// =============================================================================
// Log File
// =============================================================================

/// Size at which the `--log-file` output rolls over to `<file>.1`
pub const LOG_FILE_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Rolled-over log files kept (`<file>.1` .. `<file>.N`)
pub const LOG_FILE_BACKUPS: usize = 5;
