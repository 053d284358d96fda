use pretty_assertions::assert_eq;
use roastery_store::{CorruptionPolicy, DocumentStore, StoreConfig, StoreError};
use roastery_types::{Document, STORE_VERSION};
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn snapshot_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(".corrupted."))
        })
        .collect()
}

// ── Lazy initialization ──────────────────────────────────────────

#[tokio::test]
async fn read_initializes_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DocumentStore::open(&path);

    let doc = store.read().await.unwrap();
    assert!(doc.users.is_empty());
    assert!(doc.products.is_empty());
    assert!(doc.orders.is_empty());
    assert!(doc.customers.is_empty());
    assert_eq!(doc.version.as_deref(), Some(STORE_VERSION));
    assert!(doc.created_at.is_some());
    assert!(path.exists());
}

// ── Round trip ───────────────────────────────────────────────────

#[tokio::test]
async fn write_then_read_round_trip() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    let mut doc = Document::new();
    doc.users.push(json!({"id": 1, "email": "a@x.com", "name": "A"}));
    doc.products.push(json!({"sku": "COL-500", "name": "Huila"}));

    let written = store.write(&doc).await.unwrap();
    let read = store.read().await.unwrap();

    assert_eq!(read.users, doc.users);
    assert_eq!(read.products, doc.products);
    assert_eq!(read.orders, doc.orders);
    assert_eq!(read.customers, doc.customers);
    assert_eq!(read.version, doc.version);
    // last_updated is stamped by the writer, everything else survives
    // structurally intact.
    assert!(read.last_updated.is_some());
    assert_eq!(read.last_updated, written.last_updated);
}

#[tokio::test]
async fn write_stamps_last_updated_and_defaults_version() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    let mut doc = Document::new();
    doc.version = None;
    let written = store.write(&doc).await.unwrap();

    assert!(written.last_updated.is_some());
    assert_eq!(written.version.as_deref(), Some(STORE_VERSION));
}

#[tokio::test]
async fn write_preserves_existing_version() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    let mut doc = Document::new();
    doc.version = Some("3.2.1".to_string());
    let written = store.write(&doc).await.unwrap();
    assert_eq!(written.version.as_deref(), Some("3.2.1"));
}

#[tokio::test]
async fn file_is_pretty_printed_with_two_space_indent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DocumentStore::open(&path);

    store.write(&Document::new()).await.unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("{\n  \""));
    assert!(content.ends_with("\n"));
}

#[tokio::test]
async fn unknown_top_level_fields_survive_rewrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"users": [], "store_name": "Roastery"}"#).unwrap();

    let store = DocumentStore::open(&path);
    let doc = store.read().await.unwrap();
    store.write(&doc).await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("store_name"));
}

// ── Backup ───────────────────────────────────────────────────────

#[tokio::test]
async fn write_backs_up_previous_committed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DocumentStore::open(&path);

    store.write(&Document::new()).await.unwrap();

    let mut doc = store.read().await.unwrap();
    doc.users.push(json!({"id": 1, "email": "a@x.com"}));
    store.write(&doc).await.unwrap();

    let backup = std::fs::read_to_string(store.config().backup_path()).unwrap();
    let previous = Document::from_value(serde_json::from_str(&backup).unwrap()).unwrap();
    assert!(previous.users.is_empty());

    let current = store.read().await.unwrap();
    assert_eq!(current.users.len(), 1);
}

// ── Corruption recovery ──────────────────────────────────────────

#[tokio::test]
async fn corrupt_file_is_snapshotted_and_reset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json at all {{{").unwrap();

    let store = DocumentStore::open(&path);
    let doc = store.read().await.unwrap();
    assert!(doc.users.is_empty());
    assert_eq!(doc.version.as_deref(), Some(STORE_VERSION));

    let snapshots = snapshot_files(dir.path());
    assert_eq!(snapshots.len(), 1);
    let preserved = std::fs::read_to_string(&snapshots[0]).unwrap();
    assert_eq!(preserved, "not json at all {{{");

    // the backing file is valid again
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&content).is_ok());
}

#[tokio::test]
async fn non_object_top_level_counts_as_corruption() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = DocumentStore::open(&path);
    let doc = store.read().await.unwrap();
    assert!(doc.users.is_empty());
    assert_eq!(snapshot_files(dir.path()).len(), 1);
}

#[tokio::test]
async fn fail_policy_surfaces_corruption_and_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "garbage").unwrap();

    let store = DocumentStore::new(
        StoreConfig::new(&path).with_corruption_policy(CorruptionPolicy::Fail),
    );
    let err = store.read().await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    assert!(snapshot_files(dir.path()).is_empty());
}

// ── write_value ──────────────────────────────────────────────────

#[tokio::test]
async fn write_value_rejects_non_object() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    let err = store.write_value(json!([1, 2])).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument));
    let err = store.write_value(json!(null)).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidDocument));
}

#[tokio::test]
async fn write_value_coerces_collections() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    let written = store
        .write_value(json!({"users": 42, "products": [{"sku": "ETH-250"}]}))
        .await
        .unwrap();
    assert!(written.users.is_empty());
    assert_eq!(written.products.len(), 1);
}

// ── I/O failure ──────────────────────────────────────────────────

#[tokio::test]
async fn failed_write_surfaces_write_failed_and_keeps_last_good_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DocumentStore::open(&path);
    store.write(&Document::new()).await.unwrap();

    // a directory squatting on the temp path makes the commit fail after
    // the lock is held
    std::fs::create_dir(store.config().temp_path()).unwrap();

    let mut doc = store.read().await.unwrap();
    doc.users.push(json!({"id": 1, "email": "a@x.com"}));
    let err = store.write(&doc).await.unwrap_err();
    assert!(matches!(err, StoreError::WriteFailed(_)));

    // the committed file is untouched and the lock was released
    let current = store.read().await.unwrap();
    assert!(current.users.is_empty());
    assert!(!store.config().lock_path().exists());
}

#[tokio::test]
async fn unreadable_path_is_unavailable() {
    let dir = tempdir().unwrap();
    // The "document" is a directory: reading it is an I/O error that is
    // not NotFound and not corruption.
    let store = DocumentStore::open(dir.path());

    let err = store.read().await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

// ── Lock integration ─────────────────────────────────────────────

#[tokio::test]
async fn read_releases_lock_marker() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("store.json"));

    store.read().await.unwrap();
    assert!(!store.config().lock_path().exists());
}

#[tokio::test]
async fn read_times_out_while_lock_is_held() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = DocumentStore::new(
        StoreConfig::new(&path).with_lock_timeout(std::time::Duration::from_millis(50)),
    );

    // A foreign holder keeps the marker for the whole window.
    std::fs::write(store.config().lock_path(), "12345").unwrap();

    let err = store.read().await.unwrap_err();
    assert!(matches!(err, StoreError::LockTimeout(_)));

    std::fs::remove_file(store.config().lock_path()).unwrap();
    store.read().await.unwrap();
}
