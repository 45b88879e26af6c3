//! Whole-index JSON snapshots.
//!
//! Every save rewrites the full file. The bytes go to a temporary file in the
//! destination directory first and are renamed over the target only after an
//! fsync, so readers see either the old snapshot or the new one.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::{StorageError, StorageResult};
use crate::documents::{Chunk, ChunkMetadata};
use crate::vector::{EntryId, IndexEntry, VectorIndex};

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// File name of the snapshot inside the index directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    model: &'a str,
    saved_at: String,
    embedding_dimension: Option<usize>,
    next_id: u32,
    entries: Vec<EntryOut<'a>>,
}

#[derive(Serialize)]
struct EntryOut<'a> {
    id: EntryId,
    text: &'a str,
    metadata: &'a ChunkMetadata,
    vector: &'a [f32],
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    model: String,
    saved_at: String,
    embedding_dimension: Option<usize>,
    next_id: u32,
    entries: Vec<EntryIn>,
}

#[derive(Deserialize)]
struct EntryIn {
    id: EntryId,
    text: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

/// A restored snapshot together with its header.
#[derive(Debug)]
pub struct Snapshot {
    /// Embedding model that produced the stored vectors.
    pub model: String,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    pub index: VectorIndex,
}

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `<index_dir>/snapshot.json`.
    pub fn in_dir(index_dir: impl AsRef<Path>) -> Self {
        Self::new(index_dir.as_ref().join(SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the whole index, replacing any previous snapshot atomically.
    pub fn save(&self, index: &VectorIndex, model: &str) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let snapshot = SnapshotOut {
            version: SNAPSHOT_VERSION,
            model,
            saved_at: chrono::Utc::now().to_rfc3339(),
            embedding_dimension: index.dimension(),
            next_id: index.next_id(),
            entries: index
                .entries()
                .iter()
                .map(|entry| EntryOut {
                    id: entry.id,
                    text: &entry.chunk.text,
                    metadata: &entry.chunk.metadata,
                    vector: &entry.vector,
                })
                .collect(),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path).map_err(|e| StorageError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        tracing::debug!(
            target: "storage",
            "saved {} entries to {}",
            index.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the index, or `None` when no snapshot has been written yet.
    pub fn load(&self) -> StorageResult<Option<VectorIndex>> {
        Ok(self.read()?.map(|snapshot| snapshot.index))
    }

    /// Load the index along with the snapshot header.
    pub fn read(&self) -> StorageResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let raw: SnapshotIn = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e))?;

        if raw.version != SNAPSHOT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                raw.version
            )));
        }

        let entries = raw
            .entries
            .into_iter()
            .map(|entry| IndexEntry {
                id: entry.id,
                chunk: Chunk {
                    text: entry.text,
                    metadata: entry.metadata,
                },
                vector: entry.vector,
            })
            .collect();

        let index = VectorIndex::from_parts(raw.embedding_dimension, raw.next_id, entries)
            .map_err(|reason| self.corrupt(reason))?;

        tracing::debug!(
            target: "storage",
            "loaded {} entries from {} (model {}, saved {})",
            index.len(),
            self.path.display(),
            raw.model,
            raw.saved_at
        );

        Ok(Some(Snapshot {
            model: raw.model,
            saved_at: raw.saved_at,
            index,
        }))
    }

    fn corrupt(&self, reason: impl ToString) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
