//! The content document
//!
//! One JSON object drives the whole site. Its top-level keys fall into
//! three kinds (see [`EntryKind`]): the single `GLOBAL_DATA` entry with
//! shared reference data, all-uppercase per-visitor profile entries, and
//! anything else (ignored by validation and the session view).
//!
//! [`ContentDocument`] keeps the raw `serde_json::Value` as the source of
//! truth so arbitrary dotted-path patches stay possible, and layers typed
//! helpers for the operations the bot and API actually perform.

use crate::case::{CaseDetails, CaseId, CaseRecord, CaseStudy};
use crate::error::ContentError;
use serde_json::{Map, Value};

/// Top-level key holding shared reference data
pub const GLOBAL_DATA_KEY: &str = "GLOBAL_DATA";

/// Classification of a top-level document entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The shared `GLOBAL_DATA` section
    Global,
    /// A per-visitor profile (key equals its uppercase form)
    Profile,
    /// Anything else; carried through writes untouched
    Other,
}

impl EntryKind {
    /// Classify a top-level key
    #[must_use]
    pub fn classify(key: &str) -> Self {
        if key == GLOBAL_DATA_KEY {
            Self::Global
        } else if key == key.to_uppercase() {
            Self::Profile
        } else {
            Self::Other
        }
    }
}

/// Typed view over the content JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    root: Value,
}

impl ContentDocument {
    /// Wrap a parsed JSON value
    ///
    /// # Errors
    /// Returns [`ContentError::NotAnObject`] if the root is not an object.
    pub fn new(root: Value) -> Result<Self, ContentError> {
        if root.is_object() {
            Ok(Self { root })
        } else {
            Err(ContentError::NotAnObject)
        }
    }

    /// Borrow the raw root value
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume into the raw root value
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Value {
        self.root
    }

    fn root_map(&self) -> &Map<String, Value> {
        // Invariant: constructor rejected non-objects.
        self.root.as_object().expect("document root is an object")
    }

    fn root_map_mut(&mut self) -> &mut Map<String, Value> {
        self.root
            .as_object_mut()
            .expect("document root is an object")
    }

    /// Get the value at a dotted path
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Set the value at a dotted path
    ///
    /// Intermediate objects are created as needed; non-object values on
    /// the way are replaced by objects.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<_> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let map = current.as_object_mut().expect("just ensured object");
            current = map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        if let Value::Object(map) = current {
            map.insert((*last).to_string(), value);
        }
    }

    /// The shared `GLOBAL_DATA` section, if present
    #[inline]
    #[must_use]
    pub fn global(&self) -> Option<&Value> {
        self.root_map().get(GLOBAL_DATA_KEY)
    }

    /// Iterate visitor profiles as `(access_code, record)` pairs
    pub fn profiles(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root_map()
            .iter()
            .filter(|(key, _)| EntryKind::classify(key) == EntryKind::Profile)
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Number of visitor profiles
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles().count()
    }

    /// The `case_studies` map inside `GLOBAL_DATA`, if present
    #[must_use]
    pub fn case_studies(&self) -> Option<&Map<String, Value>> {
        self.get_path("GLOBAL_DATA.case_studies")?.as_object()
    }

    /// Ids of all case studies, in document order
    #[must_use]
    pub fn case_ids(&self) -> Vec<String> {
        self.case_studies()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a case study with this id exists
    #[must_use]
    pub fn case_exists(&self, id: &str) -> bool {
        self.case_studies().is_some_and(|map| map.contains_key(id))
    }

    /// Load a full case record
    ///
    /// # Errors
    /// [`ContentError::CaseNotFound`] if no summary exists for the id;
    /// [`ContentError::MalformedCase`] if the stored JSON does not fit
    /// the record shape. Missing details are treated as empty.
    pub fn case(&self, id: &CaseId) -> Result<CaseRecord, ContentError> {
        let study_value = self
            .get_path("GLOBAL_DATA.case_studies")
            .and_then(|v| v.get(id.as_str()))
            .ok_or_else(|| ContentError::CaseNotFound(id.to_string()))?;
        let study: CaseStudy =
            serde_json::from_value(study_value.clone()).map_err(|e| {
                ContentError::MalformedCase {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let details: CaseDetails = match self
            .get_path("GLOBAL_DATA.case_details")
            .and_then(|v| v.get(id.as_str()))
        {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                ContentError::MalformedCase {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            })?,
            None => CaseDetails::default(),
        };

        Ok(CaseRecord {
            id: id.clone(),
            study,
            details,
        })
    }

    /// Insert or overwrite a case record
    pub fn insert_case(&mut self, record: &CaseRecord) {
        let study = serde_json::to_value(&record.study).expect("case study serializes");
        let details =
            serde_json::to_value(&record.details).expect("case details serializes");
        self.set_path(
            &format!("GLOBAL_DATA.case_studies.{}", record.id),
            study,
        );
        self.set_path(
            &format!("GLOBAL_DATA.case_details.{}", record.id),
            details,
        );
    }

    /// Access codes of profiles referencing a case in `meta.cases`
    #[must_use]
    pub fn profiles_using_case(&self, id: &str) -> Vec<String> {
        self.profiles()
            .filter(|(_, profile)| profile_references_case(profile, id))
            .map(|(code, _)| code.to_string())
            .collect()
    }

    /// Delete a case study and all references to it
    ///
    /// Removes the summary, the details, and the id from every profile's
    /// `meta.cases` list. Returns the access codes of updated profiles.
    ///
    /// # Errors
    /// [`ContentError::CaseNotFound`] if the id has no summary entry.
    pub fn delete_case(&mut self, id: &str) -> Result<Vec<String>, ContentError> {
        if !self.case_exists(id) {
            return Err(ContentError::CaseNotFound(id.to_string()));
        }

        if let Some(Value::Object(map)) = self
            .root
            .get_mut(GLOBAL_DATA_KEY)
            .and_then(|g| g.get_mut("case_studies"))
        {
            map.remove(id);
        }
        if let Some(Value::Object(map)) = self
            .root
            .get_mut(GLOBAL_DATA_KEY)
            .and_then(|g| g.get_mut("case_details"))
        {
            map.remove(id);
        }

        let mut updated = Vec::new();
        for (key, value) in self.root_map_mut().iter_mut() {
            if EntryKind::classify(key) != EntryKind::Profile {
                continue;
            }
            if let Some(Value::Array(cases)) = value
                .get_mut("meta")
                .and_then(|meta| meta.get_mut("cases"))
            {
                let before = cases.len();
                cases.retain(|entry| entry.as_str() != Some(id));
                if cases.len() != before {
                    updated.push(key.clone());
                }
            }
        }
        Ok(updated)
    }

    /// Build the merged per-visitor view for an access code
    ///
    /// Starts from the profile record and fills in the shared sections
    /// the front end renders: `menu`, the experience list for the
    /// profile's `meta.timeline`, case studies and details (restricted to
    /// `meta.cases` when the profile lists them), `skills`, and
    /// `contact`. Keys the profile already defines win over shared data.
    ///
    /// # Errors
    /// [`ContentError::UnknownAccessCode`] when the code has no profile.
    pub fn session_view(&self, code: &str) -> Result<Value, ContentError> {
        let profile = self
            .root_map()
            .get(code)
            .filter(|_| EntryKind::classify(code) == EntryKind::Profile)
            .ok_or_else(|| ContentError::UnknownAccessCode(code.to_string()))?;

        let mut view = profile.as_object().cloned().unwrap_or_default();
        let global = self.global().and_then(Value::as_object);

        let timeline = profile
            .get("meta")
            .and_then(|meta| meta.get("timeline"))
            .and_then(Value::as_str);
        let case_filter: Option<Vec<&str>> = profile
            .get("meta")
            .and_then(|meta| meta.get("cases"))
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect());

        if let Some(global) = global {
            for section in ["menu", "skills", "contact"] {
                if let Some(value) = global.get(section) {
                    view.entry(section.to_string())
                        .or_insert_with(|| value.clone());
                }
            }

            let experience = timeline
                .and_then(|t| global.get("experience").and_then(|e| e.get(t)))
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            view.entry("experience".to_string()).or_insert(experience);

            for section in ["case_studies", "case_details"] {
                if let Some(Value::Object(map)) = global.get(section) {
                    let filtered: Map<String, Value> = match &case_filter {
                        Some(ids) => map
                            .iter()
                            .filter(|(id, _)| ids.contains(&id.as_str()))
                            .map(|(id, v)| (id.clone(), v.clone()))
                            .collect(),
                        None => map.clone(),
                    };
                    view.entry(section.to_string())
                        .or_insert(Value::Object(filtered));
                }
            }
        }

        Ok(Value::Object(view))
    }
}

fn profile_references_case(profile: &Value, id: &str) -> bool {
    profile
        .get("meta")
        .and_then(|meta| meta.get("cases"))
        .and_then(Value::as_array)
        .is_some_and(|cases| cases.iter().any(|entry| entry.as_str() == Some(id)))
}
