// src/client.rs
//
// External storage client seam
//
// The storage client is an executable driven with an argument list, extra
// environment and a timeout. Exit code and captured output are the whole
// contract; `StorageClient` lets tests substitute an in-process fake.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use crate::error::CommandError;

/// Extra environment for one child process, applied over the parent's
pub type ClientEnv = Vec<(String, String)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Run one client command.
    ///
    /// Ok only on a zero exit status; non-zero exits, timeouts and spawn
    /// failures come back as distinct `CommandError` variants.
    async fn execute(
        &self,
        args: &[String],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Runs the real client binary as a subprocess
#[derive(Debug, Clone)]
pub struct ProcessClient {
    binary: PathBuf,
}

impl ProcessClient {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn describe(&self, args: &[String]) -> String {
        let mut s = self.binary.display().to_string();
        for a in args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

#[async_trait]
impl StorageClient for ProcessClient {
    async fn execute(
        &self,
        args: &[String],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let command = self.describe(args);
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| CommandError::Spawn {
            command: command.clone(),
            source,
        })?;

        let started = Instant::now();
        // On timeout the child is dropped with the future and killed
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(CommandError::Spawn { command, source }),
            Err(_) => return Err(CommandError::TimedOut { command, timeout }),
        };
        trace!(elapsed = ?started.elapsed(), status = ?output.status, "{}", command);

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            Err(CommandError::Failed {
                command,
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            })
        }
    }
}

/// `s3://bucket/` or `s3://bucket/key`
pub fn s3_uri(bucket: &str, key: Option<&str>) -> String {
    match key {
        Some(k) => format!("s3://{}/{}", bucket, k.trim_start_matches('/')),
        None => format!("s3://{}/", bucket),
    }
}

/// `[prefix/]name` with empty prefixes skipped
pub fn object_key(subfolder: Option<&str>, name: &str) -> String {
    match subfolder {
        Some(s) if !s.is_empty() => format!("{}/{}", s.trim_matches('/'), name),
        _ => name.to_string(),
    }
}

/// Object keys from a long-format listing.
///
/// An entry line has at least four fields and a numeric size column before
/// the last field; the last field is the key. Headers, totals and blank
/// lines are skipped.
pub fn parse_listing(stdout: &str, bucket: &str) -> Vec<String> {
    let prefix = s3_uri(bucket, None);
    stdout
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let (last, rest) = fields.split_last()?;
            if !rest.iter().any(|f| f.parse::<u64>().is_ok()) {
                return None;
            }
            let key = last.strip_prefix(prefix.as_str()).unwrap_or(last);
            if key.is_empty() || key.ends_with('/') {
                return None;
            }
            Some(key.to_string())
        })
        .collect()
}

/// Flatten a key into a single local file name component
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
