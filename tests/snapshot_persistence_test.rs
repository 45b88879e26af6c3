//! Snapshot save/restore behaviour across store instances.

use std::fs;

use docrag::storage::{SNAPSHOT_FILE, StorageError};
use docrag::{Chunk, SnapshotStore, VectorIndex};
use tempfile::TempDir;

fn index_with(docs: &[(&str, &[&str])]) -> VectorIndex {
    let mut index = VectorIndex::new();
    for (i, (doc, texts)) in docs.iter().enumerate() {
        let chunks = Chunk::from_texts(doc, texts.iter().copied());
        let vectors = (0..texts.len())
            .map(|j| vec![1.0 + i as f32, j as f32, 0.5])
            .collect();
        index.insert(chunks, vectors).unwrap();
    }
    index
}

#[test]
fn test_round_trip_preserves_search_results() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::in_dir(temp_dir.path());
    let index = index_with(&[("a.md", &["one", "two"]), ("b.md", &["three"])]);

    store.save(&index, "hashing-fnv1a-3").unwrap();
    let restored = SnapshotStore::new(store.path()).load().unwrap().unwrap();

    assert_eq!(restored.entries(), index.entries());
    let query = [1.0, 0.5, 0.5];
    assert_eq!(
        restored.search(&query, 3).unwrap(),
        index.search(&query, 3).unwrap()
    );
}

#[test]
fn test_restored_index_continues_id_sequence() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::in_dir(temp_dir.path());
    store
        .save(&index_with(&[("a.md", &["one", "two"])]), "m")
        .unwrap();

    let mut restored = store.load().unwrap().unwrap();
    let ids = restored
        .insert(Chunk::from_texts("b.md", ["three"]), vec![vec![0.0, 1.0, 0.0]])
        .unwrap();
    assert_eq!(ids[0].get(), 3);
}

#[test]
fn test_failed_save_keeps_previous_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let index_dir = temp_dir.path().join("index");
    let store = SnapshotStore::in_dir(&index_dir);
    let index = index_with(&[("a.md", &["one"])]);
    store.save(&index, "m").unwrap();
    let before = fs::read(store.path()).unwrap();

    // Pointing at a path whose parent is a regular file makes the save fail
    let blocked = SnapshotStore::new(store.path().join(SNAPSHOT_FILE));
    let bigger = index_with(&[("a.md", &["one"]), ("b.md", &["two"])]);
    assert!(matches!(blocked.save(&bigger, "m"), Err(StorageError::Io(_))));

    assert_eq!(fs::read(store.path()).unwrap(), before);
    assert_eq!(store.load().unwrap().unwrap().len(), 1);
}

#[test]
fn test_truncated_file_is_reported_not_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::in_dir(temp_dir.path());
    store
        .save(&index_with(&[("a.md", &["one", "two"])]), "m")
        .unwrap();

    let bytes = fs::read(store.path()).unwrap();
    fs::write(store.path(), &bytes[..bytes.len() / 2]).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
    assert!(err.to_string().contains("snapshot.json"));
}
