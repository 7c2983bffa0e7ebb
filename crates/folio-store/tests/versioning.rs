//! End-to-end versioning scenarios: rotation, rollback, round-trips.

use folio_content::ContentDocument;
use folio_store::{ContentStore, StoreConfig, StoreError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn doc(marker: u64) -> ContentDocument {
    ContentDocument::new(json!({
        "GLOBAL_DATA": {
            "menu": ["intro", "cases"],
            "experience": {"scenario_a": []},
            "skills": ["rust"],
            "marker": marker
        },
        "ACME": {"meta": {"company": "Acme", "timeline": "scenario_a"}}
    }))
    .unwrap()
}

#[test]
fn write_read_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store = ContentStore::new(StoreConfig::new(
        tmp.path().join("content.json"),
        tmp.path().join("backups"),
    ));

    let original = doc(42);
    store.write(&original).unwrap();
    assert_eq!(store.read().unwrap(), original);
}

#[test]
fn rotation_keeps_exactly_retention_snapshots() {
    let tmp = TempDir::new().unwrap();
    let retention = 4;
    let store = ContentStore::new(
        StoreConfig::new(tmp.path().join("content.json"), tmp.path().join("backups"))
            .with_retention(retention),
    );

    // retention + 2 mutations: the first creates no snapshot (nothing to
    // back up), the rest snapshot the previous state each time.
    for i in 0..=(retention as u64 + 1) {
        store.write(&doc(i)).unwrap();
    }

    let names = store.backups().list();
    assert_eq!(names.len(), retention);

    // Snapshots correspond to the most recent pre-write states, newest first.
    for (version, expected_marker) in (1..=retention).zip((1..=retention as u64).rev()) {
        let (value, _) = store.backups().load(version).unwrap();
        assert_eq!(value["GLOBAL_DATA"]["marker"], json!(expected_marker));
    }
}

#[test]
fn load_one_is_always_the_latest_snapshot() {
    let tmp = TempDir::new().unwrap();
    let store = ContentStore::new(StoreConfig::new(
        tmp.path().join("content.json"),
        tmp.path().join("backups"),
    ));

    for i in 0..3 {
        store.write(&doc(i)).unwrap();
        if i > 0 {
            let (latest, _) = store.backups().load(1).unwrap();
            assert_eq!(latest["GLOBAL_DATA"]["marker"], json!(i - 1));
        }
    }
}

#[test]
fn rollback_restores_exact_bytes_and_snapshots_current() {
    let tmp = TempDir::new().unwrap();
    let store = ContentStore::new(StoreConfig::new(
        tmp.path().join("content.json"),
        tmp.path().join("backups"),
    ));

    // Four writes produce three backups (states 0, 1, 2); current is 3.
    for i in 0..4 {
        store.write(&doc(i)).unwrap();
    }
    assert_eq!(store.backups().list().len(), 3);

    let target = store.backups().dir().join(&store.backups().list()[1]);
    let expected_bytes = fs::read(&target).unwrap();

    let outcome = store.rollback(2).unwrap();
    assert!(outcome.backup.is_some());

    // Content now matches the second-most-recent backup byte for byte.
    let restored_bytes = fs::read(store.content_path()).unwrap();
    assert_eq!(restored_bytes, expected_bytes);

    // Exactly one new snapshot appeared, holding the pre-rollback state.
    assert_eq!(store.backups().list().len(), 4);
    let (pre_rollback, _) = store.backups().load(1).unwrap();
    assert_eq!(pre_rollback["GLOBAL_DATA"]["marker"], json!(3));
}

#[test]
fn rollback_of_missing_version_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let store = ContentStore::new(StoreConfig::new(
        tmp.path().join("content.json"),
        tmp.path().join("backups"),
    ));
    store.write(&doc(0)).unwrap();

    assert!(matches!(
        store.rollback(1),
        Err(StoreError::VersionNotFound { requested: 1, available: 0 })
    ));
    // Content untouched by the failed rollback.
    assert_eq!(store.read().unwrap(), doc(0));
}
