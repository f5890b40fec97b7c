// src/lock.rs
//
// Host-wide process exclusivity via an advisory lock file
//
// The file holds the holder's pid followed by a newline. A stale file left by
// a crashed process carries no lock, so the next generator simply takes over.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::LockError;

/// Exclusive lock held for the lifetime of the value
#[derive(Debug)]
pub struct ProcessLock {
    path: PathBuf,
    file: Option<File>,
}

impl ProcessLock {
    /// Acquire without waiting. Fails with `LockError::Held` if another
    /// process (or another handle in this process) holds the lock.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        let io_err = |source: io::Error| LockError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // No truncate: the current holder's pid must survive a failed attempt
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == io::ErrorKind::WouldBlock || e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                let holder = read_pid(&mut file);
                return Err(LockError::Held { path, holder });
            }
            return Err(io_err(e));
        }

        let pid = std::process::id();
        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        writeln!(file, "{}", pid).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        info!(path = %path.display(), pid, "acquired process lock");
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file and drop the lock. Idempotent.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "failed to remove lock file: {}", e);
                }
            }
            if let Err(e) = FileExt::unlock(&file) {
                debug!("unlock failed (released on close anyway): {}", e);
            }
            debug!(path = %self.path.display(), "released process lock");
        }
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

/// Pid recorded in a lock file, if any
pub fn read_holder(path: &Path) -> Option<u32> {
    let text = fs::read_to_string(path).ok()?;
    text.trim().parse().ok()
}

/// Whether a process with `pid` exists (signal 0 probe)
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs permission and existence checks only
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Holder status for the `status` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    NotRunning,
    Running(u32),
    /// File present but its pid is gone
    Stale(Option<u32>),
}

pub fn status(path: &Path) -> LockStatus {
    if !path.exists() {
        return LockStatus::NotRunning;
    }
    match read_holder(path) {
        Some(pid) if is_alive(pid) => LockStatus::Running(pid),
        other => LockStatus::Stale(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_writes_pid_and_release_removes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.lock");
        let mut lock = ProcessLock::acquire(&path).unwrap();
        assert_eq!(read_holder(&path), Some(std::process::id()));
        assert_eq!(status(&path), LockStatus::Running(std::process::id()));

        lock.release();
        assert!(!path.exists());
        lock.release();
        assert_eq!(status(&path), LockStatus::NotRunning);
    }

    #[test]
    fn test_second_acquire_fails_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.lock");
        let _held = ProcessLock::acquire(&path).unwrap();

        match ProcessLock::acquire(&path) {
            Err(LockError::Held { holder, .. }) => assert_eq!(holder, Some(std::process::id())),
            other => panic!("expected Held, got {:?}", other),
        }
        // The failed attempt must not clobber the holder's pid
        assert_eq!(read_holder(&path), Some(std::process::id()));
    }

    #[test]
    fn test_stale_file_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.lock");
        fs::write(&path, "999999999\n").unwrap();
        assert!(matches!(status(&path), LockStatus::Stale(_)));

        let _lock = ProcessLock::acquire(&path).unwrap();
        assert_eq!(read_holder(&path), Some(std::process::id()));
    }

    #[test]
    fn test_is_alive() {
        assert!(is_alive(std::process::id()));
        assert!(!is_alive(0));
    }
}
