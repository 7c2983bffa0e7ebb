//! Structural validation of the content document
//!
//! The validator enforces the minimal shape the site depends on before
//! any write is accepted: a `GLOBAL_DATA` section with the shared
//! collections, and at least one well-formed visitor profile. Errors
//! accumulate so the operator sees every problem at once; only the
//! top-level type check short-circuits.

use crate::document::{EntryKind, GLOBAL_DATA_KEY};
use crate::error::ContentError;
use serde_json::Value;

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether the document may be written
    pub valid: bool,
    /// Itemized failures, empty when valid
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert into a result, keeping the itemized messages
    ///
    /// # Errors
    /// [`ContentError::Validation`] when the report is invalid.
    pub fn into_result(self) -> Result<(), ContentError> {
        if self.valid {
            Ok(())
        } else {
            Err(ContentError::Validation {
                errors: self.errors,
            })
        }
    }
}

/// Validate a candidate content document
///
/// Never mutates the input. Rules are checked in order and all
/// violations are reported together.
#[must_use]
pub fn validate(content: &Value) -> ValidationReport {
    let Some(root) = content.as_object() else {
        return ValidationReport::from_errors(vec!["Content must be an object".to_string()]);
    };

    let mut errors = Vec::new();

    match root.get(GLOBAL_DATA_KEY) {
        None => errors.push("GLOBAL_DATA is required".to_string()),
        Some(global) => check_global(global, &mut errors),
    }

    let mut has_profile = false;
    for (key, value) in root {
        if EntryKind::classify(key) != EntryKind::Profile {
            continue;
        }
        has_profile = true;
        if !profile_is_valid(value) {
            errors.push(format!("Profile {key} has invalid structure"));
        }
    }
    if !has_profile {
        errors.push("At least one profile is required".to_string());
    }

    ValidationReport::from_errors(errors)
}

fn check_global(global: &Value, errors: &mut Vec<String>) {
    let Some(map) = global.as_object() else {
        errors.push("GLOBAL_DATA must be an object".to_string());
        return;
    };

    match map.get("menu") {
        None => errors.push("GLOBAL_DATA.menu is required".to_string()),
        Some(menu) if !menu.is_array() => {
            errors.push("GLOBAL_DATA.menu must be a list".to_string());
        }
        Some(_) => {}
    }
    match map.get("experience") {
        None => errors.push("GLOBAL_DATA.experience is required".to_string()),
        Some(experience) if !experience.is_object() => {
            errors.push("GLOBAL_DATA.experience must be an object".to_string());
        }
        Some(_) => {}
    }
    if map.get("skills").is_none() {
        errors.push("GLOBAL_DATA.skills is required".to_string());
    }
}

fn profile_is_valid(profile: &Value) -> bool {
    let Some(meta) = profile.get("meta") else {
        return false;
    };
    meta.get("company").is_some_and(Value::is_string)
        && meta.get("timeline").is_some_and(Value::is_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn valid_doc() -> Value {
        json!({
            "GLOBAL_DATA": {
                "menu": ["intro"],
                "experience": {"scenario_a": []},
                "skills": ["rust"]
            },
            "ACME": {
                "meta": {"company": "Acme", "timeline": "scenario_a"}
            }
        })
    }

    #[test]
    fn accepts_valid_document() {
        let report = validate(&valid_doc());
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn rejects_non_object() {
        for value in [json!(null), json!(42), json!([1]), json!("doc")] {
            let report = validate(&value);
            assert!(!report.valid);
            assert_eq!(report.errors, vec!["Content must be an object"]);
        }
    }

    #[test]
    fn requires_global_data() {
        let report = validate(&json!({
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }));
        assert!(!report.valid);
        assert!(report.errors.contains(&"GLOBAL_DATA is required".to_string()));
    }

    #[test]
    fn reports_each_global_section_separately() {
        let report = validate(&json!({
            "GLOBAL_DATA": {"menu": "not-a-list"},
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }));
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"GLOBAL_DATA.menu must be a list".to_string()));
        assert!(report
            .errors
            .contains(&"GLOBAL_DATA.experience is required".to_string()));
        assert!(report
            .errors
            .contains(&"GLOBAL_DATA.skills is required".to_string()));
    }

    #[test]
    fn requires_at_least_one_profile() {
        let report = validate(&json!({
            "GLOBAL_DATA": {"menu": [], "experience": {}, "skills": []}
        }));
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"At least one profile is required".to_string()));
    }

    #[test]
    fn flags_malformed_profiles_by_key() {
        let report = validate(&json!({
            "GLOBAL_DATA": {"menu": [], "experience": {}, "skills": []},
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}},
            "BROKEN": {"meta": {"company": 7}},
            "ALSO_BROKEN": {}
        }));
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"Profile BROKEN has invalid structure".to_string()));
        assert!(report
            .errors
            .contains(&"Profile ALSO_BROKEN has invalid structure".to_string()));
        // The good profile satisfies the at-least-one rule
        assert!(!report
            .errors
            .contains(&"At least one profile is required".to_string()));
    }

    #[test]
    fn lowercase_keys_are_not_profiles() {
        let report = validate(&json!({
            "GLOBAL_DATA": {"menu": [], "experience": {}, "skills": []},
            "notes": "free-form, ignored",
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }));
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn validation_never_mutates() {
        let doc = valid_doc();
        let before = doc.clone();
        let _ = validate(&doc);
        assert_eq!(doc, before);
    }

    proptest! {
        // Any object without GLOBAL_DATA and without uppercase keys fails
        // with a non-empty error list.
        #[test]
        fn prop_missing_global_and_profiles_rejected(
            keys in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 0..5)
        ) {
            let mut map = serde_json::Map::new();
            for key in keys {
                map.insert(key, json!({"anything": true}));
            }
            let report = validate(&Value::Object(map));
            prop_assert!(!report.valid);
            prop_assert!(!report.errors.is_empty());
        }
    }
}
