// src/logfile.rs
//
// Append-only log file that rolls over by size. `<file>` is renamed to
// `<file>.1`, older backups shift up by one, and the oldest is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::constants::{LOG_FILE_BACKUPS, LOG_FILE_MAX_BYTES};

#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Open with the default size limit and backup count
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::with_limits(path, LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS)
    }

    /// Open `path` for appending, creating parent directories as needed.
    /// An existing file keeps its content and counts toward `max_bytes`.
    pub fn with_limits(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups == 0 {
            self.file = OpenOptions::new().write(true).truncate(true).open(&self.path)?;
            self.written = 0;
            return Ok(());
        }
        for n in (1..self.backups).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A single record larger than the limit still lands in one file
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_to_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/traffic.log");

        let mut first = RotatingFile::open(&path).unwrap();
        first.write_all(b"first run\n").unwrap();
        drop(first);

        let mut second = RotatingFile::open(&path).unwrap();
        second.write_all(b"second run\n").unwrap();
        drop(second);

        assert_eq!(fs::read_to_string(&path).unwrap(), "first run\nsecond run\n");
    }

    #[test]
    fn test_rolls_over_and_keeps_bounded_backups() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("traffic.log");
        let mut log = RotatingFile::with_limits(&path, 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            log.write_all(line.as_bytes()).unwrap();
        }
        log.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(fs::read_to_string(log.backup_path(1)).unwrap(), "cccccccc\n");
        assert_eq!(fs::read_to_string(log.backup_path(2)).unwrap(), "bbbbbbbb\n");
        assert!(!log.backup_path(3).exists(), "oldest backup must be dropped");
    }

    #[test]
    fn test_oversized_record_is_not_split() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("traffic.log");
        let mut log = RotatingFile::with_limits(&path, 4, 1).unwrap();

        log.write_all(b"0123456789\n").unwrap();
        log.write_all(b"x\n").unwrap();

        assert_eq!(fs::read_to_string(log.backup_path(1)).unwrap(), "0123456789\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
    }
}
