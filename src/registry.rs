//! In-flight operation table.
//!
//! Every action registers the local path it is about to touch before the first
//! filesystem mutation or client invocation, and releases it when the action
//! finishes. Cleanup only ever deletes a path after checking this table under
//! the same lock, so nothing mid-flight is removed.
//!
//! The table sits behind a reentrant lock: a thread that already holds it via
//! [`OperationRegistry::hold`] can still call every query method.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, trace};

use crate::constants::DRAIN_POLL_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Generate,
    Upload,
    Download,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Generate => f.write_str("generate"),
            OperationKind::Upload => f.write_str("upload"),
            OperationKind::Download => f.write_str("download"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub path: PathBuf,
    pub kind: OperationKind,
    pub actor_id: String,
    pub started: Instant,
    pub started_at: DateTime<Utc>,
    pub worker: ThreadId,
    token: u64,
}

/// Outcome of a gated delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// A live record holds the path; nothing was touched
    Protected,
    /// The path did not exist
    Missing,
}

type Table = HashMap<PathBuf, Vec<OperationRecord>>;

#[derive(Default)]
pub struct OperationRegistry {
    table: ReentrantMutex<RefCell<Table>>,
    next_token: AtomicU64,
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("active", &self.len())
            .finish()
    }
}

/// Exclusive hold on the registry for a batch of queries
pub struct RegistryHold<'a> {
    _guard: ReentrantMutexGuard<'a, RefCell<Table>>,
}

/// Live registration; dropping it unregisters.
#[must_use = "dropping the guard immediately unregisters the operation"]
pub struct OperationGuard<'a> {
    registry: &'a OperationRegistry,
    path: PathBuf,
    token: u64,
}

impl OperationGuard<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.path, self.token);
    }
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<PathBuf>, kind: OperationKind, actor_id: &str) -> OperationGuard<'_> {
        let path = path.into();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let record = OperationRecord {
            path: path.clone(),
            kind,
            actor_id: actor_id.to_string(),
            started: Instant::now(),
            started_at: Utc::now(),
            worker: thread::current().id(),
            token,
        };

        let guard = self.table.lock();
        guard.borrow_mut().entry(path.clone()).or_default().push(record);
        trace!(actor = %actor_id, %kind, path = %path.display(), "registered operation");

        OperationGuard {
            registry: self,
            path,
            token,
        }
    }

    fn release(&self, path: &Path, token: u64) {
        let guard = self.table.lock();
        let mut table = guard.borrow_mut();
        if let Some(records) = table.get_mut(path) {
            records.retain(|r| r.token != token);
            if records.is_empty() {
                table.remove(path);
            }
        }
    }

    /// Drop every record for `path`. Unknown paths are ignored.
    pub fn unregister(&self, path: &Path) {
        let guard = self.table.lock();
        if guard.borrow_mut().remove(path).is_some() {
            trace!(path = %path.display(), "unregistered operation");
        }
    }

    pub fn is_in_use(&self, path: &Path) -> bool {
        let guard = self.table.lock();
        let in_use = guard.borrow().contains_key(path);
        in_use
    }

    pub fn active_for(&self, actor_id: &str) -> Vec<PathBuf> {
        let guard = self.table.lock();
        let table = guard.borrow();
        let paths = table
            .iter()
            .filter(|(_, records)| records.iter().any(|r| r.actor_id == actor_id))
            .map(|(path, _)| path.clone())
            .collect();
        paths
    }

    pub fn records(&self) -> Vec<OperationRecord> {
        let guard = self.table.lock();
        let table = guard.borrow();
        let records = table.values().flatten().cloned().collect();
        records
    }

    /// Number of distinct registered paths
    pub fn len(&self) -> usize {
        let guard = self.table.lock();
        let n = guard.borrow().len();
        n
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block other threads from registering until the hold is dropped.
    pub fn hold(&self) -> RegistryHold<'_> {
        RegistryHold {
            _guard: self.table.lock(),
        }
    }

    /// Delete `path` only if no record holds it; check and delete happen
    /// under the registry lock.
    pub fn remove_if_unused(&self, path: &Path) -> io::Result<RemoveOutcome> {
        let guard = self.table.lock();
        if guard.borrow().contains_key(path) {
            debug!(path = %path.display(), "path in use, not removing");
            return Ok(RemoveOutcome::Protected);
        }
        match std::fs::remove_file(path) {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RemoveOutcome::Missing),
            Err(e) => Err(e),
        }
    }

    /// [`remove_if_unused`](Self::remove_if_unused) on the blocking pool,
    /// for callers running on async workers.
    pub async fn discard(self: Arc<Self>, path: PathBuf) -> io::Result<RemoveOutcome> {
        tokio::task::spawn_blocking(move || self.remove_if_unused(&path))
            .await
            .map_err(io::Error::other)?
    }

    /// Poll until `actor_id` has no registered paths. False on timeout.
    pub async fn await_drained(&self, actor_id: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.active_for(actor_id).is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}
