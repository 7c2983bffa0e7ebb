//! Snapshot files with retention
//!
//! Every successful mutation snapshots the previous content into
//! `content-<timestamp>.json`. The timestamp is UTC ISO-8601 with the
//! filesystem-hostile `:` and `.` replaced by `-`, so lexicographic
//! order over filenames is chronological order. Snapshot creation is
//! best-effort: failures are logged and never block the caller's write.

use crate::error::StoreError;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const BACKUP_PREFIX: &str = "content-";
const BACKUP_SUFFIX: &str = ".json";

/// Rotating snapshot directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    /// Create a manager over a snapshot directory
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    /// The snapshot directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot the given serialized content, then prune old snapshots
    ///
    /// Returns the created path, or `None` on any I/O failure. Failures
    /// are logged; the caller's write proceeds either way.
    pub fn create(&self, raw: &str) -> Option<PathBuf> {
        match self.try_create(raw) {
            Ok(path) => {
                debug!(path = %path.display(), "backup created");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, dir = %self.dir.display(), "backup creation failed");
                None
            }
        }
    }

    fn try_create(&self, raw: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let mut path = self.dir.join(backup_filename());
        // Same-instant writes get a fresh timestamp instead of clobbering.
        for _ in 0..5 {
            if !path.exists() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
            path = self.dir.join(backup_filename());
        }

        fs::write(&path, raw)?;
        self.prune();
        Ok(path)
    }

    /// Snapshot filenames, newest first
    ///
    /// An absent directory is an empty history, not an error.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX))
            .collect();
        // Zero-padded timestamps: lexicographic descending == newest first.
        names.sort_unstable_by(|a, b| b.cmp(a));
        names
    }

    /// Load a snapshot by 1-indexed version (1 = most recent)
    ///
    /// Returns the parsed document and the snapshot filename.
    ///
    /// # Errors
    /// [`StoreError::VersionNotFound`] outside `[1, count]`;
    /// [`StoreError::Io`] / [`StoreError::Parse`] if the file cannot be
    /// read back.
    pub fn load(&self, version: usize) -> Result<(Value, String), StoreError> {
        let names = self.list();
        if version < 1 || version > names.len() {
            return Err(StoreError::VersionNotFound {
                requested: version,
                available: names.len(),
            });
        }
        let name = names[version - 1].clone();
        let raw = fs::read_to_string(self.dir.join(&name))?;
        let value: Value = serde_json::from_str(&raw)?;
        Ok((value, name))
    }

    fn prune(&self) {
        for name in self.list().into_iter().skip(self.retention) {
            let path = self.dir.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => debug!(file = %name, "pruned old backup"),
                Err(err) => warn!(error = %err, file = %name, "failed to prune backup"),
            }
        }
    }
}

fn backup_filename() -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%6fZ");
    format!("{BACKUP_PREFIX}{timestamp}{BACKUP_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_is_empty_for_absent_dir() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path().join("never-created"), 10);
        assert!(manager.list().is_empty());
    }

    #[test]
    fn create_then_load_most_recent() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path(), 10);

        manager.create(r#"{"v": 1}"#).unwrap();
        manager.create(r#"{"v": 2}"#).unwrap();

        let (value, name) = manager.load(1).unwrap();
        assert_eq!(value["v"], 2);
        assert!(name.starts_with("content-") && name.ends_with(".json"));

        let (older, _) = manager.load(2).unwrap();
        assert_eq!(older["v"], 1);
    }

    #[test]
    fn load_out_of_range() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path(), 10);
        manager.create("{}").unwrap();

        assert!(matches!(
            manager.load(0),
            Err(StoreError::VersionNotFound { requested: 0, available: 1 })
        ));
        assert!(matches!(
            manager.load(2),
            Err(StoreError::VersionNotFound { requested: 2, available: 1 })
        ));
    }

    #[test]
    fn prunes_beyond_retention() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path(), 3);

        for i in 0..5 {
            manager.create(&format!(r#"{{"v": {i}}}"#)).unwrap();
        }

        let names = manager.list();
        assert_eq!(names.len(), 3);
        // The survivors are the three most recent writes.
        let (newest, _) = manager.load(1).unwrap();
        assert_eq!(newest["v"], 4);
        let (oldest_kept, _) = manager.load(3).unwrap();
        assert_eq!(oldest_kept["v"], 2);
    }

    #[test]
    fn ignores_unrelated_files() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path(), 10);
        std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        std::fs::write(tmp.path().join("content-bad.tmp"), "x").unwrap();
        manager.create("{}").unwrap();

        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn create_reports_failure_as_none() {
        let tmp = TempDir::new().unwrap();
        // A file where the directory should be makes create_dir_all fail.
        let blocked = tmp.path().join("blocked");
        std::fs::write(&blocked, "occupied").unwrap();
        let manager = BackupManager::new(&blocked, 10);

        assert!(manager.create("{}").is_none());
    }
}
