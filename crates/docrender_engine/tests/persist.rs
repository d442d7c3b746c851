use std::fs;

use docrender_engine::{
    ensure_dir, AtomicFileWriter, DocumentStore, FileDocumentStore, PersistError, DOCUMENT_KEY,
};
use tempfile::TempDir;

#[test]
fn creates_missing_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.pdf", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.pdf");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("doc.pdf", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("doc.pdf", b"data").is_err());
    assert!(!file_path.with_file_name("doc.pdf").exists());
}

#[test]
fn store_round_trips_and_reports_missing_key() {
    let temp = TempDir::new().unwrap();
    let store = FileDocumentStore::new(temp.path().join("state"));

    assert_eq!(store.get(DOCUMENT_KEY).unwrap(), None);
    store.put(DOCUMENT_KEY, "# Title\n").unwrap();
    assert_eq!(store.get(DOCUMENT_KEY).unwrap().as_deref(), Some("# Title\n"));
}

#[test]
fn store_rejects_path_like_keys() {
    let temp = TempDir::new().unwrap();
    let store = FileDocumentStore::new(temp.path());

    assert!(matches!(
        store.put("../escape.md", "x"),
        Err(PersistError::InvalidKey(_))
    ));
    assert!(matches!(store.get(""), Err(PersistError::InvalidKey(_))));
}
