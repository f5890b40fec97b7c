//! Error taxonomy for the traffic generator.
//!
//! Per-action failures (`SynthesisError`, `CommandError`, wrapped in
//! `ActionError`) are caught at the action boundary and counted; they never
//! reach the actor loop driver. `LockError::Held` and `ConfigError` are the
//! only errors allowed to end the process, and only before any actor starts.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Filesystem failure while writing a synthetic artifact.
#[derive(Debug, Error)]
#[error("failed to synthesize {path}")]
pub struct SynthesisError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Failure reported by (or while running) the external storage client.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The executable could not be started at all.
    #[error("failed to spawn storage client `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    /// The process outlived its deadline and was killed.
    #[error("storage client timed out after {timeout:?}: `{command}`")]
    TimedOut { command: String, timeout: Duration },
    /// The process exited unsuccessfully.
    #[error("storage client exited with {exit_code:?}: `{command}`: {stderr}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl CommandError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::TimedOut { .. })
    }
}

/// One failed upload or download attempt.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("local io failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An actor's in-flight operations did not clear before its drain deadline.
#[derive(Debug, Error)]
#[error("actor {actor_id} still has {remaining} in-flight operation(s) after {timeout:?}")]
pub struct DrainTimeout {
    pub actor_id: String,
    pub remaining: usize,
    pub timeout: Duration,
}

/// Process-exclusivity lock failures.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("another traffic generator holds {path} (pid {})", holder.map(|p| p.to_string()).unwrap_or_else(|| "unknown".into()))]
    Held { path: PathBuf, holder: Option<u32> },
    #[error("lock file io failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Invalid generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no actors configured")]
    NoActors,
    #[error("duplicate actor id `{0}`")]
    DuplicateActor(String),
    #[error("actor `{actor}`: {reason}")]
    InvalidActor { actor: String, reason: String },
    #[error("file type `{file_type}`: {reason}")]
    InvalidFileType { file_type: String, reason: String },
    #[error("{0}")]
    Invalid(String),
}
