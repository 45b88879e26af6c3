//! End-to-end ingestion and retrieval through the public API.

use std::sync::Arc;
use std::thread;

use docrag::documents::RawChunk;
use docrag::{
    Chunker, ChunkingConfig, HashEmbedder, RagError, RagResult, Retriever, SnapshotStore,
};
use tempfile::TempDir;

/// Splits on blank lines so tests control chunk boundaries exactly.
struct ParagraphChunker;

impl Chunker for ParagraphChunker {
    fn chunk(&self, content: &str, _config: &ChunkingConfig) -> RagResult<Vec<RawChunk>> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        for part in content.split("\n\n") {
            if !part.trim().is_empty() {
                chunks.push(RawChunk::new((offset, offset + part.len()), part.to_string()));
            }
            offset += part.len() + 2;
        }
        Ok(chunks)
    }
}

fn retriever(dir: &TempDir) -> Retriever {
    Retriever::new(
        Arc::new(HashEmbedder::new(128).unwrap()),
        SnapshotStore::in_dir(dir.path().join("index")),
        ChunkingConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_cat_document_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let retriever = retriever(&temp_dir).with_chunker(ParagraphChunker);

    let report = retriever
        .ingest("A", "the cat sat\n\nsat on the mat")
        .unwrap();
    assert_eq!(report.chunks_indexed, 2);

    let hits = retriever.retrieve("where did the cat sit", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);
    assert_eq!(hits[0].text(), "the cat sat");

    let mut indices: Vec<u32> = hits.iter().map(|h| h.metadata().sequence_index).collect();
    indices.sort();
    assert_eq!(indices, vec![0, 1]);
    assert!(hits.iter().all(|h| h.metadata().source_document_id == "A"));
}

#[test]
fn test_k_larger_than_index() {
    let temp_dir = TempDir::new().unwrap();
    let retriever = retriever(&temp_dir).with_chunker(ParagraphChunker);
    retriever.ingest("doc", "alpha\n\nbeta\n\ngamma").unwrap();

    let hits = retriever.retrieve("alpha", 50).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(retriever.retrieve("alpha", 0).unwrap().is_empty());
}

#[test]
fn test_restart_restores_same_results() {
    let temp_dir = TempDir::new().unwrap();
    let text = "Rust ownership rules prevent data races.\n\n\
                The borrow checker enforces aliasing rules.\n\n\
                Cargo builds and tests crates.";

    let before = {
        let first = retriever(&temp_dir).with_chunker(ParagraphChunker);
        first.ingest("rust.md", text).unwrap();
        first.retrieve("how are data races prevented", 3).unwrap()
    };

    let second = retriever(&temp_dir);
    second.ensure_loaded().unwrap();
    assert_eq!(second.stats().entries, 3);

    let after = second.retrieve("how are data races prevented", 3).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_fresh_process_appends_to_existing_snapshot() {
    let temp_dir = TempDir::new().unwrap();

    retriever(&temp_dir)
        .with_chunker(ParagraphChunker)
        .ingest("one.txt", "first\n\nsecond")
        .unwrap();

    // A new retriever that ingests without querying first
    let second = retriever(&temp_dir).with_chunker(ParagraphChunker);
    second.ingest("two.txt", "third").unwrap();
    assert_eq!(second.stats().entries, 3);

    let third = retriever(&temp_dir);
    let hits = third.retrieve("first", 10).unwrap();
    assert_eq!(hits.len(), 3);
    let mut ids: Vec<u32> = hits.iter().map(|h| h.id.get()).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_dimension_drift_surfaces_at_query_time() {
    let temp_dir = TempDir::new().unwrap();
    retriever(&temp_dir).ingest("a.txt", "some text").unwrap();

    let drifted = Retriever::new(
        Arc::new(HashEmbedder::new(32).unwrap()),
        SnapshotStore::in_dir(temp_dir.path().join("index")),
        ChunkingConfig::default(),
    )
    .unwrap();

    let err = drifted.retrieve("some", 1).unwrap_err();
    assert!(matches!(
        err,
        RagError::DimensionMismatch {
            expected: 128,
            actual: 32
        }
    ));

    let err = drifted.ingest("b.txt", "more text").unwrap_err();
    assert_eq!(err.kind(), "dimension_mismatch");
    assert_eq!(drifted.stats().entries, 1);
}

#[test]
fn test_concurrent_ingestion_is_serialized() {
    let temp_dir = TempDir::new().unwrap();
    let retriever = Arc::new(retriever(&temp_dir).with_chunker(ParagraphChunker));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let retriever = Arc::clone(&retriever);
            thread::spawn(move || {
                let text = format!("doc {i} part one\n\ndoc {i} part two");
                retriever.ingest(&format!("doc-{i}"), &text).unwrap();
                retriever.retrieve("part", 3).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(retriever.stats().entries, 16);

    let reloaded = Retriever::new(
        Arc::new(HashEmbedder::new(128).unwrap()),
        SnapshotStore::in_dir(temp_dir.path().join("index")),
        ChunkingConfig::default(),
    )
    .unwrap();
    reloaded.ensure_loaded().unwrap();
    assert_eq!(reloaded.stats().entries, 16);
}

#[test]
fn test_long_document_chunks_with_default_chunker() {
    let temp_dir = TempDir::new().unwrap();
    let retriever = Retriever::new(
        Arc::new(HashEmbedder::new(64).unwrap()),
        SnapshotStore::in_dir(temp_dir.path()),
        ChunkingConfig::new(200, 40),
    )
    .unwrap();

    let text = "Sentence about indexing vectors. ".repeat(40);
    let report = retriever.ingest("long.txt", &text).unwrap();
    assert!(report.chunks_indexed > 1);

    let hits = retriever.retrieve("indexing", 100).unwrap();
    assert_eq!(hits.len(), report.chunks_indexed);
    assert!(hits.iter().all(|h| h.chunk.char_count() <= 200));
}
