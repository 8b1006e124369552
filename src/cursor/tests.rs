//! Tests for cursor stores

use super::*;
use chrono::{DateTime, Utc};
use tempfile::tempdir;
use tokio_test::{assert_err, assert_ok};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

// ============================================================================
// InMemoryCursor Tests
// ============================================================================

#[tokio::test]
async fn test_in_memory_cursor_starts_empty() {
    let cursor = InMemoryCursor::default();
    assert!(cursor.get().await.unwrap().is_none());
}

#[tokio::test]
async fn test_in_memory_cursor_seeded() {
    let cursor = InMemoryCursor::new(Some(ts("2024-01-01T00:00:00Z")));
    assert_eq!(cursor.get().await.unwrap(), Some(ts("2024-01-01T00:00:00Z")));
}

#[tokio::test]
async fn test_in_memory_cursor_set_and_share() {
    let cursor = InMemoryCursor::default();
    let clone = cursor.clone();

    cursor.set(ts("2024-02-01T00:00:00Z")).await;

    assert_eq!(clone.get().await.unwrap(), Some(ts("2024-02-01T00:00:00Z")));
}

// ============================================================================
// FileCursor Tests
// ============================================================================

#[tokio::test]
async fn test_file_cursor_missing_file_is_none() {
    let dir = tempdir().unwrap();
    let cursor = FileCursor::new(dir.path().join("cursor.json"));

    assert!(cursor.get().await.unwrap().is_none());
    assert_eq!(assert_ok!(cursor.load().await), None);
}

#[tokio::test]
async fn test_file_cursor_roundtrip_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cursor.json");

    FileCursor::new(&path).set(ts("2024-03-01T12:30:00Z")).await;

    let reopened = FileCursor::new(&path);
    assert_eq!(reopened.get().await.unwrap(), Some(ts("2024-03-01T12:30:00Z")));
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_file_cursor_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state").join("cursor.json");
    let cursor = FileCursor::new(&path);

    assert_ok!(cursor.try_set(ts("2024-01-01T00:00:00Z")).await);
    assert!(path.exists());
}

#[tokio::test]
async fn test_file_cursor_document_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cursor.json");

    FileCursor::new(&path).set(ts("2024-01-01T00:00:00Z")).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let document: CursorDocument = serde_json::from_str(&contents).unwrap();
    assert_eq!(document.value, Some(ts("2024-01-01T00:00:00Z")));
}

#[tokio::test]
async fn test_file_cursor_unreadable_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    let cursor = FileCursor::new(&path);

    cursor.set(ts("2024-06-01T00:00:00Z")).await;
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    // Neither this instance nor a fresh one may report "no checkpoint"
    assert_err!(cursor.load().await);
    assert_err!(cursor.get().await);
    assert_err!(FileCursor::new(&path).get().await);
}

#[tokio::test]
async fn test_file_cursor_unpersisted_value_is_ahead_of_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    let cursor = FileCursor::new(&path);

    cursor.set(ts("2024-01-01T00:00:00Z")).await;
    // A directory in place of the temp file makes later writes fail
    std::fs::create_dir(path.with_extension("tmp")).unwrap();
    cursor.set(ts("2024-02-01T00:00:00Z")).await;

    assert_eq!(
        assert_ok!(cursor.load().await),
        Some(ts("2024-01-01T00:00:00Z"))
    );
    assert_eq!(
        cursor.get().await.unwrap(),
        Some(ts("2024-02-01T00:00:00Z"))
    );
}

#[tokio::test]
async fn test_file_cursor_set_failure_does_not_panic() {
    let dir = tempdir().unwrap();
    // A directory where the file should be makes the rename fail
    let path = dir.path().join("cursor.json");
    std::fs::create_dir(&path).unwrap();

    let cursor = FileCursor::new(&path);
    assert_err!(cursor.try_set(ts("2024-01-01T00:00:00Z")).await);

    cursor.set(ts("2024-01-02T00:00:00Z")).await;
}
