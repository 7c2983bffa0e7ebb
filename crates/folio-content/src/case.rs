//! Case study records
//!
//! A case study is split across two sections of `GLOBAL_DATA`:
//! - `case_studies[id]`: the summary card ([`CaseStudy`])
//! - `case_details[id]`: the long-form write-up ([`CaseDetails`])
//!
//! [`CaseRecord`] bundles both under a validated [`CaseId`] and is the
//! unit the guided flows produce and the document persists.

use crate::error::ContentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slug-like case identifier
///
/// Lowercase ASCII letters, digits, and underscores; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseId(String);

impl CaseId {
    /// Parse a candidate id
    ///
    /// # Errors
    /// Returns [`ContentError::InvalidCaseId`] if the input is empty or
    /// contains anything outside `[a-z0-9_]`.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ContentError::InvalidCaseId(raw.to_string()))
        }
    }

    /// The id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CaseId {
    type Error = ContentError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<CaseId> for String {
    fn from(id: CaseId) -> Self {
        id.0
    }
}

/// Summary card shown in case listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    /// Project title
    #[serde(default)]
    pub title: String,
    /// Short description
    #[serde(default)]
    pub desc: String,
    /// Headline metric string
    #[serde(default)]
    pub metrics: String,
    /// Tag list
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Long-form case write-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetails {
    /// Problem statement
    #[serde(default)]
    pub challenge: String,
    /// Ordered approach steps
    #[serde(default)]
    pub approach: Vec<String>,
    /// Solution description
    #[serde(default)]
    pub solution: String,
    /// Ordered outcome items
    #[serde(default)]
    pub results: Vec<String>,
    /// Retrospective notes
    #[serde(default)]
    pub learnings: String,
}

/// A complete case study record
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    /// Validated identifier
    pub id: CaseId,
    /// Summary card
    pub study: CaseStudy,
    /// Detailed write-up
    pub details: CaseDetails,
}

impl CaseRecord {
    /// Create a record with empty study and details
    #[inline]
    #[must_use]
    pub fn empty(id: CaseId) -> Self {
        Self {
            id,
            study: CaseStudy::default(),
            details: CaseDetails::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_id_accepts_slugs() {
        assert!(CaseId::parse("gmx_v2").is_ok());
        assert!(CaseId::parse("defi_protocol_2024").is_ok());
        assert!(CaseId::parse("a").is_ok());
    }

    #[test]
    fn case_id_rejects_bad_input() {
        assert!(CaseId::parse("").is_err());
        assert!(CaseId::parse("GMX").is_err());
        assert!(CaseId::parse("has space").is_err());
        assert!(CaseId::parse("dash-ed").is_err());
        assert!(CaseId::parse("dot.ted").is_err());
    }

    #[test]
    fn case_id_deserializes_with_validation() {
        let ok: Result<CaseId, _> = serde_json::from_str("\"gmx_v2\"");
        assert!(ok.is_ok());

        let bad: Result<CaseId, _> = serde_json::from_str("\"GMX V2\"");
        assert!(bad.is_err());
    }

    #[test]
    fn case_study_fills_missing_fields() {
        let study: CaseStudy = serde_json::from_str(r#"{"title": "GMX"}"#).unwrap();
        assert_eq!(study.title, "GMX");
        assert_eq!(study.desc, "");
        assert!(study.tags.is_empty());
    }
}
