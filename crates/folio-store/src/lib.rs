//! Versioned content store
//!
//! Owns the content file on disk and the snapshot directory next to it:
//! - [`ContentStore`]: validated read/write/patch plus rollback, with a
//!   pre-mutation snapshot taken on every successful write
//! - [`BackupManager`]: timestamped `content-<ts>.json` snapshots,
//!   pruned to the most recent N
//! - [`diff`]: recursive structural comparison between two documents
//!
//! Single-writer by design: there is no locking and no concurrency
//! token on the document. The deployment target is one administrative
//! operator at a time.

mod backup;
mod diff;
mod error;
mod store;

pub use backup::BackupManager;
pub use diff::{diff, DiffEntry, DiffKind};
pub use error::StoreError;
pub use store::{ContentStore, RollbackOutcome, StoreConfig, StoreStats, DEFAULT_RETENTION};
