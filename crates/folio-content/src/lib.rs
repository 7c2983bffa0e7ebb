//! Content document model for the portfolio site
//!
//! The entire site is driven by a single JSON document holding shared
//! reference data (`GLOBAL_DATA`) plus one record per visitor access code.
//! This crate owns the typed view over that document:
//! - [`ContentDocument`]: dotted-path access, entry classification,
//!   case-study CRUD, and the merged per-visitor session view
//! - [`validate`]: structural validation with accumulated error messages
//! - [`CaseRecord`] and friends: the case-study data the guided flows
//!   collect and persist

mod case;
mod document;
mod error;
mod validator;

pub use case::{CaseDetails, CaseId, CaseRecord, CaseStudy};
pub use document::{ContentDocument, EntryKind, GLOBAL_DATA_KEY};
pub use error::ContentError;
pub use validator::{validate, ValidationReport};
