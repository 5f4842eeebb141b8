//! Tests for the JSON-backed profile store.

use serde_json::{json, Map, Value};
use tempfile::TempDir;
use webrig::ProfileStore;

fn record(fields: &[(&str, Value)]) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_set_get_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProfileStore::open(dir.path()).expect("open");

    store
        .set("Profile 1", record(&[("proxy", json!("socks5://10.0.0.1"))]))
        .expect("set");

    let stored = store.get("Profile 1").expect("present");
    assert_eq!(stored["profile_id"], "Profile 1");
    assert_eq!(stored["proxy"], "socks5://10.0.0.1");
    assert!(stored["created_at"].is_string());
    assert!(stored["updated_at"].is_string());
}

#[test]
fn test_created_at_survives_rewrites() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProfileStore::open(dir.path()).expect("open");

    store
        .set("p", record(&[("v", json!(1))]))
        .expect("first set");
    let created = store.get("p").expect("present")["created_at"].clone();

    std::thread::sleep(std::time::Duration::from_millis(5));
    store
        .set("p", record(&[("v", json!(2))]))
        .expect("second set");

    let stored = store.get("p").expect("present");
    assert_eq!(stored["created_at"], created, "created_at is set once");
    assert_eq!(stored["v"], 2);
    // Timestamps are in a lexicographically sortable form.
    let updated = stored["updated_at"].as_str().expect("string");
    assert!(updated >= created.as_str().expect("string"));
}

#[test]
fn test_persisted_across_store_instances() {
    let dir = TempDir::new().expect("tempdir");
    {
        let mut store = ProfileStore::open(dir.path()).expect("open");
        store
            .set("persisted", record(&[("lang", json!("en-US"))]))
            .expect("set");
    }

    let reopened = ProfileStore::open(dir.path()).expect("reopen");
    let stored = reopened.get("persisted").expect("loaded from disk");
    assert_eq!(stored["lang"], "en-US");
}

#[test]
fn test_remove_deletes_entry() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProfileStore::open(dir.path()).expect("open");
    store.set("gone", Map::new()).expect("set");
    store.remove("gone").expect("remove");
    assert!(store.get("gone").is_none());
    // Removing a missing key is a no-op.
    store.remove("never-existed").expect("no-op remove");
}

#[test]
fn test_clear_resets_store_and_backing_file() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProfileStore::open(dir.path()).expect("open");
    store.set("a", Map::new()).expect("set");
    store.set("b", Map::new()).expect("set");

    store.clear().expect("clear");
    assert!(store.get("a").is_none());
    assert!(store.get("b").is_none());
    assert!(store.records().is_empty());
    // The backing file is recreated empty.
    assert!(store.path().is_file());
    let reopened = ProfileStore::open(dir.path()).expect("reopen");
    assert!(reopened.records().is_empty());
}

#[test]
fn test_open_creates_missing_file() {
    let dir = TempDir::new().expect("tempdir");
    let store = ProfileStore::open(dir.path()).expect("open");
    assert!(store.path().is_file());
    assert!(store.records().is_empty());
}

#[test]
fn test_create_profile_pins_hashed_fingerprint() {
    let dir = TempDir::new().expect("tempdir");
    let mut store = ProfileStore::open(dir.path()).expect("open");

    let first = store.create_profile("Profile 1").expect("create");
    let second = store.create_profile("Profile 1").expect("recreate");

    // The hashed draw is deterministic, so recreation pins the same
    // fingerprint.
    assert_eq!(first["user_agent"], second["user_agent"]);
    assert_eq!(first["window_size"], second["window_size"]);
    assert!(first["user_agent"].as_str().expect("string").contains("Mozilla/5.0"));
    let window_size = first["window_size"].as_str().expect("string");
    assert!(window_size.contains(','));
}
