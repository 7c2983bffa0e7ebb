//! Content store accessor
//!
//! Read-modify-write over the single content file. Every accepted write
//! follows the same sequence: validate the candidate, snapshot whatever
//! was on disk before (best-effort), then overwrite with pretty-printed
//! JSON. A rejected document never touches the store.

use crate::backup::BackupManager;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use folio_content::{validate, ContentDocument};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How many snapshots survive pruning
pub const DEFAULT_RETENTION: usize = 10;

/// Where the content lives and how much history to keep
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the content JSON file
    pub content_path: PathBuf,
    /// Directory for rotating snapshots
    pub backup_dir: PathBuf,
    /// Snapshots kept after each backup
    pub retention: usize,
}

impl StoreConfig {
    /// Config with the default retention
    #[inline]
    #[must_use]
    pub fn new(content_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_path: content_path.into(),
            backup_dir: backup_dir.into(),
            retention: DEFAULT_RETENTION,
        }
    }

    /// Override the retention count
    #[inline]
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }
}

/// Content statistics reported by the admin API and `/status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of visitor profiles
    pub profiles_count: usize,
    /// Number of case studies
    pub case_count: usize,
    /// Content file mtime
    pub last_modified: DateTime<Utc>,
    /// Content file size in bytes
    pub file_size: u64,
}

/// Result of a rollback
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    /// Filename of the snapshot that was restored
    pub restored: String,
    /// Snapshot taken of the pre-rollback content, if one was created
    pub backup: Option<PathBuf>,
}

/// The content store
#[derive(Debug, Clone)]
pub struct ContentStore {
    config: StoreConfig,
    backups: BackupManager,
}

impl ContentStore {
    /// Open a store over the configured paths
    ///
    /// Nothing is touched on disk until the first read or write.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let backups = BackupManager::new(config.backup_dir.clone(), config.retention);
        Self { config, backups }
    }

    /// The snapshot manager for this store
    #[inline]
    #[must_use]
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Path of the content file
    #[inline]
    #[must_use]
    pub fn content_path(&self) -> &Path {
        &self.config.content_path
    }

    /// Read the raw content file
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when the file is absent, [`StoreError::Io`]
    /// on other filesystem failures.
    pub fn read_raw(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.config.content_path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    path: self.config.content_path.clone(),
                }
            } else {
                StoreError::Io(err)
            }
        })
    }

    /// Read and parse the content document
    ///
    /// # Errors
    /// [`StoreError::NotFound`], [`StoreError::Parse`], or
    /// [`StoreError::Io`]; the caller decides any fallback.
    pub fn read(&self) -> Result<ContentDocument, StoreError> {
        let raw = self.read_raw()?;
        let value: Value = serde_json::from_str(&raw)?;
        Ok(ContentDocument::new(value)?)
    }

    /// Content statistics
    ///
    /// # Errors
    /// Same failure modes as [`ContentStore::read`].
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let raw = self.read_raw()?;
        let value: Value = serde_json::from_str(&raw)?;
        let doc = ContentDocument::new(value)?;
        let metadata = fs::metadata(&self.config.content_path)?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(StoreStats {
            profiles_count: doc.profile_count(),
            case_count: doc.case_ids().len(),
            last_modified,
            file_size: metadata.len(),
        })
    }

    /// Validate and persist a full document
    ///
    /// Snapshots the previous content first when any existed. Returns the
    /// snapshot path, `None` when there was nothing to back up or the
    /// snapshot failed (best-effort by design).
    ///
    /// # Errors
    /// [`StoreError::Validation`] leaves the store untouched;
    /// [`StoreError::Io`] if the write itself fails.
    pub fn write(&self, doc: &ContentDocument) -> Result<Option<PathBuf>, StoreError> {
        validate(doc.root()).into_result()?;

        let backup = match self.read_raw() {
            Ok(previous) => self.backups.create(&previous),
            Err(StoreError::NotFound { .. }) => {
                debug!("no existing content to back up");
                None
            }
            Err(err) => {
                // Existing content we cannot read back gets overwritten
                // without a snapshot; make that loud, not silent.
                warn!(error = %err, "existing content unreadable; skipping backup");
                None
            }
        };

        let pretty = serde_json::to_string_pretty(doc.root())?;
        fs::write(&self.config.content_path, pretty)?;
        info!(
            path = %self.config.content_path.display(),
            backup = ?backup,
            "content written"
        );
        Ok(backup)
    }

    /// Apply a dotted-path assignment and persist
    ///
    /// # Errors
    /// [`StoreError::BadRequest`] on an empty path; otherwise the same
    /// failure modes as [`ContentStore::read`] and [`ContentStore::write`].
    pub fn patch(&self, path: &str, value: Value) -> Result<Option<PathBuf>, StoreError> {
        if path.trim().is_empty() {
            return Err(StoreError::BadRequest(
                "path and value are required".to_string(),
            ));
        }
        let mut doc = self.read()?;
        doc.set_path(path, value);
        self.write(&doc)
    }

    /// Restore the content from backup `version` (1 = most recent)
    ///
    /// The write snapshots the pre-rollback state, so a rollback is
    /// itself reversible.
    ///
    /// # Errors
    /// [`StoreError::VersionNotFound`] for an out-of-range version, plus
    /// the usual write failure modes.
    pub fn rollback(&self, version: usize) -> Result<RollbackOutcome, StoreError> {
        let (value, restored) = self.backups.load(version)?;
        let doc = ContentDocument::new(value)?;
        let backup = self.write(&doc)?;
        info!(version, restored = %restored, "content rolled back");
        Ok(RollbackOutcome { restored, backup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> ContentStore {
        ContentStore::new(StoreConfig::new(
            tmp.path().join("content.json"),
            tmp.path().join("backups"),
        ))
    }

    fn valid_doc(marker: u64) -> ContentDocument {
        ContentDocument::new(json!({
            "GLOBAL_DATA": {
                "menu": ["intro"],
                "experience": {},
                "skills": [],
                "marker": marker
            },
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }))
        .unwrap()
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(matches!(store.read(), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn read_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(store.content_path(), "{not json").unwrap();
        assert!(matches!(store.read(), Err(StoreError::Parse(_))));
    }

    #[test]
    fn invalid_write_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();

        let invalid = ContentDocument::new(json!({"no_global": true})).unwrap();
        assert!(matches!(
            store.write(&invalid),
            Err(StoreError::Validation { .. })
        ));

        // Previous content still intact, no extra backup created
        assert_eq!(store.read().unwrap(), valid_doc(1));
        assert!(store.backups().list().is_empty());
    }

    #[test]
    fn first_write_creates_no_backup() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let backup = store.write(&valid_doc(1)).unwrap();
        assert!(backup.is_none());
        assert!(store.backups().list().is_empty());
    }

    #[test]
    fn unreadable_previous_content_is_overwritten_without_backup() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        // Invalid UTF-8 makes read_raw fail with an Io error, not NotFound.
        fs::write(store.content_path(), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(store.read_raw(), Err(StoreError::Io(_))));

        let backup = store.write(&valid_doc(1)).unwrap();
        assert!(backup.is_none());
        assert!(store.backups().list().is_empty());
        assert_eq!(store.read().unwrap(), valid_doc(1));
    }

    #[test]
    fn second_write_backs_up_previous() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();
        let backup = store.write(&valid_doc(2)).unwrap();
        assert!(backup.is_some());

        let (snapshot, _) = store.backups().load(1).unwrap();
        assert_eq!(snapshot["GLOBAL_DATA"]["marker"], 1);
        assert_eq!(store.read().unwrap(), valid_doc(2));
    }

    #[test]
    fn patch_assigns_dotted_path() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();

        store
            .patch("GLOBAL_DATA.contact.email", json!("hi@example.com"))
            .unwrap();
        let doc = store.read().unwrap();
        assert_eq!(
            doc.get_path("GLOBAL_DATA.contact.email"),
            Some(&json!("hi@example.com"))
        );
    }

    #[test]
    fn patch_rejects_empty_path() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();
        assert!(matches!(
            store.patch("  ", json!(1)),
            Err(StoreError::BadRequest(_))
        ));
    }

    #[test]
    fn patch_rejects_invalidating_change() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();

        let result = store.patch("GLOBAL_DATA.menu", json!("no longer a list"));
        assert!(matches!(result, Err(StoreError::Validation { .. })));
        assert_eq!(store.read().unwrap(), valid_doc(1));
    }

    #[test]
    fn stats_reflect_document() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.write(&valid_doc(1)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.profiles_count, 1);
        assert_eq!(stats.case_count, 0);
        assert!(stats.file_size > 0);
    }
}
