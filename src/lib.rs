// src/lib.rs

pub mod actor; // One task per simulated user
pub mod buckets; // Create-once bucket bookkeeping
pub mod cleanup; // Registry-gated sweeps of scratch space
pub mod client; // External storage client invocation
pub mod config;
pub mod constants;
pub mod credentials; // Per-actor credential delivery
pub mod disk; // Free-space thresholds and per-actor gate
pub mod error;
pub mod lock; // Single-instance lock file
pub mod logfile; // Size-rotated log output
pub mod metrics; // Shared counters and latency histograms
pub mod registry; // In-flight file operations
pub mod report;
pub mod schedule; // Peak windows, activity and pacing
pub mod shutdown;
pub mod size_generator; // File type and size selection
pub mod subfolder; // Templated object prefixes
pub mod supervisor;
pub mod synth; // Synthetic file content
pub mod weighted;

pub use config::GeneratorConfig;
pub use supervisor::{RunSummary, Supervisor};
