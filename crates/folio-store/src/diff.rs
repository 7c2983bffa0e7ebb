//! Structural diff between two content documents
//!
//! Compares object trees key by key, reporting one entry per dotted
//! path. Arrays are compared as opaque values: reordering or editing an
//! element registers as a single `changed` on the array's path, not as
//! element-level inserts and deletes.

use serde_json::Value;
use std::fmt;

/// What happened at a path, going from the first document to the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Key absent in the first document, present in the second
    Added,
    /// Key present in the first document, absent in the second
    Removed,
    /// Present in both with unequal values
    Changed,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Changed => f.write_str("changed"),
        }
    }
}

/// One difference at a dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Kind of change
    pub kind: DiffKind,
    /// Dotted path from the document root
    pub path: String,
}

/// Compare two documents structurally
///
/// Entries come out in traversal order: the first document's keys, then
/// keys only the second document has, recursing where both sides hold
/// non-array objects.
#[must_use]
pub fn diff(a: &Value, b: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    walk(a, b, "", &mut entries);
    entries
}

fn walk(a: &Value, b: &Value, path: &str, entries: &mut Vec<DiffEntry>) {
    match (a.as_object(), b.as_object()) {
        (Some(map_a), Some(map_b)) => {
            for (key, value_a) in map_a {
                let child = join(path, key);
                match map_b.get(key) {
                    None => entries.push(DiffEntry {
                        kind: DiffKind::Removed,
                        path: child,
                    }),
                    Some(value_b) => {
                        if value_a.is_object() && value_b.is_object() {
                            walk(value_a, value_b, &child, entries);
                        } else if value_a != value_b {
                            entries.push(DiffEntry {
                                kind: DiffKind::Changed,
                                path: child,
                            });
                        }
                    }
                }
            }
            for key in map_b.keys() {
                if !map_a.contains_key(key) {
                    entries.push(DiffEntry {
                        kind: DiffKind::Added,
                        path: join(path, key),
                    });
                }
            }
        }
        _ => {
            if a != b {
                entries.push(DiffEntry {
                    kind: DiffKind::Changed,
                    path: path.to_string(),
                });
            }
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
