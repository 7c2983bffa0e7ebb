//! Error types for the content store

use folio_content::ContentError;
use std::path::PathBuf;

/// Errors raised by store and backup operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Content file does not exist yet
    #[error("content file not found: {}", path.display())]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Content file or backup is not valid JSON
    #[error("failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document failed structural validation; the store was not touched
    #[error("invalid content structure: {}", errors.join("; "))]
    Validation {
        /// Itemized validation failures
        errors: Vec<String>,
    },

    /// Malformed request shape (empty path, missing value)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Requested backup index is out of range
    #[error("version #{requested} not found; available: 1-{available}")]
    VersionNotFound {
        /// 1-indexed version that was asked for
        requested: usize,
        /// Number of backups currently on disk
        available: usize,
    },

    /// Document-shape error from the content layer
    #[error(transparent)]
    Content(ContentError),

    /// Filesystem failure
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ContentError> for StoreError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation { errors } => Self::Validation { errors },
            other => Self::Content(other),
        }
    }
}
