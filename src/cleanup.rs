//! Registry-gated cleanup of local scratch files
//!
//! Walks a directory tree bottom-up: files are deleted only when no live
//! operation record holds them, then directories are removed if they ended up
//! empty. Running a sweep twice is harmless.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::registry::{OperationRegistry, RemoveOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_files: usize,
    pub protected_files: usize,
    pub failed_files: usize,
    pub removed_dirs: usize,
    pub root_removed: bool,
}

/// Sweep `root`, removing unregistered files and then empty directories
/// (including `root` itself when it ends up empty).
pub fn sweep(root: &Path, registry: &OperationRegistry) -> CleanupReport {
    let mut report = CleanupReport::default();
    if !root.exists() {
        debug!(root = %root.display(), "nothing to clean");
        return report;
    }

    for entry in WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("cleanup walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            match fs::remove_dir(path) {
                Ok(()) => {
                    if entry.depth() == 0 {
                        report.root_removed = true;
                    } else {
                        report.removed_dirs += 1;
                    }
                }
                Err(e) if is_not_empty(&e) => {
                    debug!(dir = %path.display(), "directory not empty, keeping");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(dir = %path.display(), "failed to remove directory: {}", e),
            }
            continue;
        }

        match registry.remove_if_unused(path) {
            Ok(RemoveOutcome::Removed) => report.removed_files += 1,
            Ok(RemoveOutcome::Protected) => {
                info!(path = %path.display(), "protected in-flight file left in place");
                report.protected_files += 1;
            }
            Ok(RemoveOutcome::Missing) => {}
            Err(e) => {
                warn!(path = %path.display(), "failed to remove file: {}", e);
                report.failed_files += 1;
            }
        }
    }

    if !report.root_removed && root.exists() {
        info!(root = %root.display(), "directory kept: still has protected or unremovable entries");
    }
    report
}

fn is_not_empty(e: &io::Error) -> bool {
    // ENOTEMPTY / EEXIST depending on platform
    e.kind() == io::ErrorKind::DirectoryNotEmpty || matches!(e.raw_os_error(), Some(libc::ENOTEMPTY) | Some(libc::EEXIST))
}
