//! Error types for content document operations

/// Errors raised by document access and mutation
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Document root is not a JSON object
    #[error("content must be an object")]
    NotAnObject,

    /// Case id does not match the slug pattern
    #[error("invalid case id {0:?}: use only lowercase letters, digits, and underscores")]
    InvalidCaseId(String),

    /// Referenced case does not exist
    #[error("case {0:?} not found")]
    CaseNotFound(String),

    /// Case id is already taken
    #[error("case {0:?} already exists")]
    CaseExists(String),

    /// Access code has no profile in the document
    #[error("unknown access code {0:?}")]
    UnknownAccessCode(String),

    /// Document failed structural validation
    #[error("invalid content structure: {}", errors.join("; "))]
    Validation {
        /// Itemized validation failures
        errors: Vec<String>,
    },

    /// Stored case data does not deserialize into the expected shape
    #[error("malformed case data for {id:?}: {reason}")]
    MalformedCase {
        /// The case id
        id: String,
        /// Deserialization failure detail
        reason: String,
    },
}
