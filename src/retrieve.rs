//! Ingestion and retrieval over a persisted vector index.
//!
//! The [`Retriever`] owns the index behind a `RwLock`. It is constructed
//! explicitly and shared by reference; nothing here is global.
//!
//! Ingestion is atomic per document. Chunking and embedding run outside the
//! lock, then insertion and the snapshot write happen under one write guard.
//! If the snapshot cannot be written the insertion is rolled back, so the
//! in-memory index never runs ahead of the file on disk.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::Settings;
use crate::documents::{Chunk, Chunker, ChunkingConfig, RecursiveChunker};
use crate::error::{RagError, RagResult};
use crate::semantic::{self, Embedder};
use crate::storage::SnapshotStore;
use crate::vector::{SearchHit, VectorIndex};

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunks_indexed: usize,
}

/// Point-in-time view of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub dimension: Option<usize>,
    /// Embedding model used for new vectors
    pub model: String,
    /// Whether the snapshot has been restored into memory yet
    pub loaded: bool,
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: SnapshotStore,
    chunker: Box<dyn Chunker>,
    chunking: ChunkingConfig,
    /// `None` until the snapshot has been restored.
    index: RwLock<Option<VectorIndex>>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("model", &self.embedder.model_name())
            .field("snapshot", &self.store.path())
            .field("chunking", &self.chunking)
            .finish()
    }
}

impl Retriever {
    /// Create a retriever. The snapshot is not read until first use or an
    /// explicit [`Retriever::ensure_loaded`].
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: SnapshotStore,
        chunking: ChunkingConfig,
    ) -> RagResult<Self> {
        chunking.validate()?;
        Ok(Self {
            embedder,
            store,
            chunker: Box::new(RecursiveChunker::new()),
            chunking,
            index: RwLock::new(None),
        })
    }

    /// Build the embedder and snapshot store described by `settings`.
    pub fn from_settings(settings: &Settings) -> RagResult<Self> {
        settings.validate()?;
        let embedder = semantic::from_settings(&settings.semantic_search)?;
        let store = SnapshotStore::new(settings.snapshot_path());
        Self::new(embedder, store, settings.chunking.clone())
    }

    /// Replace the chunking strategy.
    pub fn with_chunker(mut self, chunker: impl Chunker + 'static) -> Self {
        self.chunker = Box::new(chunker);
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Restore the persisted index if that has not happened yet.
    ///
    /// A successful restore (including "no snapshot yet") is never repeated.
    /// A failed one leaves the index unloaded, so a later call retries.
    pub fn ensure_loaded(&self) -> RagResult<()> {
        if self.index.read().is_some() {
            return Ok(());
        }
        let mut guard = self.index.write();
        self.loaded_index(&mut guard)?;
        Ok(())
    }

    fn loaded_index<'a>(&self, slot: &'a mut Option<VectorIndex>) -> RagResult<&'a mut VectorIndex> {
        if slot.is_none() {
            *slot = Some(self.restore()?);
        }
        Ok(slot.get_or_insert_with(VectorIndex::new))
    }

    fn restore(&self) -> RagResult<VectorIndex> {
        let Some(snapshot) = self.store.read()? else {
            tracing::debug!(
                target: "retrieve",
                "no snapshot at {}, starting empty",
                self.store.path().display()
            );
            return Ok(VectorIndex::new());
        };

        let model = self.embedder.model_name();
        if snapshot.model != model {
            tracing::warn!(
                target: "retrieve",
                "snapshot was built with model '{}' but '{model}' is configured",
                snapshot.model
            );
        }
        if let Some(dimension) = snapshot.index.dimension() {
            if dimension != self.embedder.dimension() {
                tracing::warn!(
                    target: "retrieve",
                    "snapshot vectors have {dimension} dimensions, embedder produces {}",
                    self.embedder.dimension()
                );
            }
        }

        tracing::info!(
            target: "retrieve",
            "restored {} entries from {} (saved {})",
            snapshot.index.len(),
            self.store.path().display(),
            snapshot.saved_at
        );
        Ok(snapshot.index)
    }

    /// Chunk, embed, index, and persist one document.
    pub fn ingest(&self, document_id: &str, text: &str) -> RagResult<IngestReport> {
        if document_id.trim().is_empty() {
            return Err(RagError::Validation(
                "document id must not be empty".to_string(),
            ));
        }

        let raw = self.chunker.chunk(text, &self.chunking)?;
        if raw.is_empty() {
            tracing::debug!(target: "retrieve", "document '{document_id}' produced no chunks");
            return Ok(IngestReport {
                document_id: document_id.to_string(),
                chunks_indexed: 0,
            });
        }

        for (sequence, chunk) in raw.iter().enumerate() {
            let (start, end) = chunk.byte_range;
            tracing::trace!(target: "retrieve", "'{document_id}' chunk {sequence}: bytes {start}..{end}");
        }
        let chunks = Chunk::from_texts(document_id, raw.into_iter().map(|c| c.content));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed(&texts)?;

        let mut guard = self.index.write();
        let index = self.loaded_index(&mut guard)?;

        let checkpoint = index.checkpoint();
        let ids = index.insert(chunks, vectors)?;

        if let Err(e) = self.store.save(index, self.embedder.model_name()) {
            index.rollback(checkpoint);
            tracing::error!(
                target: "retrieve",
                "failed to persist '{document_id}', insertion rolled back: {e}"
            );
            return Err(e.into());
        }

        tracing::info!(
            target: "retrieve",
            "indexed '{document_id}': {} chunks, {} total",
            ids.len(),
            index.len()
        );

        Ok(IngestReport {
            document_id: document_id.to_string(),
            chunks_indexed: ids.len(),
        })
    }

    /// Return up to `k` chunks most similar to `question`, best first.
    pub fn retrieve(&self, question: &str, k: usize) -> RagResult<Vec<SearchHit>> {
        if question.trim().is_empty() {
            return Err(RagError::Validation("question must not be empty".to_string()));
        }

        self.ensure_loaded()?;

        let empty = self.index.read().as_ref().is_none_or(VectorIndex::is_empty);
        if empty || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_one(question)?;

        let guard = self.index.read();
        let hits = match guard.as_ref() {
            Some(index) => index.search(&query, k)?,
            None => Vec::new(),
        };

        tracing::debug!(target: "retrieve", "query returned {} hits (k = {k})", hits.len());
        Ok(hits)
    }

    pub fn stats(&self) -> IndexStats {
        let guard = self.index.read();
        IndexStats {
            entries: guard.as_ref().map_or(0, VectorIndex::len),
            dimension: guard
                .as_ref()
                .and_then(VectorIndex::dimension)
                .or(Some(self.embedder.dimension())),
            model: self.embedder.model_name().to_string(),
            loaded: guard.is_some(),
        }
    }
}
