//! In-memory vector index with exact cosine search.
//!
//! Entries are kept in insertion order, which is also ascending id order.
//! Search is a brute-force scan; ties are broken by the earlier entry.

use super::types::{EntryId, IndexEntry, SearchHit};
use crate::documents::Chunk;
use crate::error::{RagError, RagResult};

/// Append-only collection of embedded chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    /// Fixed by the first non-empty insertion.
    dimension: Option<usize>,

    entries: Vec<IndexEntry>,

    /// Value of the next id to hand out. Never decreases.
    next_id: u32,
}

/// Bookkeeping captured before an insertion so it can be undone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    len: usize,
    dimension: Option<usize>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    /// Create an empty index with no dimension yet.
    pub fn new() -> Self {
        Self {
            dimension: None,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild an index from persisted parts, checking every invariant.
    pub(crate) fn from_parts(
        dimension: Option<usize>,
        next_id: u32,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, String> {
        if next_id == 0 {
            return Err("next_id must be at least 1".to_string());
        }

        if entries.is_empty() {
            return Ok(Self {
                dimension: None,
                entries,
                next_id,
            });
        }

        let dimension = match dimension {
            Some(d) if d > 0 => d,
            _ => return Err("entries present but embedding_dimension is missing".to_string()),
        };

        let mut previous: Option<EntryId> = None;
        for entry in &entries {
            if entry.vector.len() != dimension {
                return Err(format!(
                    "entry {} has {} dimensions, index has {dimension}",
                    entry.id,
                    entry.vector.len()
                ));
            }
            if entry.vector.iter().any(|x| !x.is_finite()) {
                return Err(format!("entry {} has a non-finite component", entry.id));
            }
            if previous.is_some_and(|prev| prev >= entry.id) {
                return Err(format!("entry ids are not increasing at {}", entry.id));
            }
            previous = Some(entry.id);
        }

        if previous.is_some_and(|last| last.get() >= next_id) {
            return Err(format!("next_id {next_id} would reuse an existing id"));
        }

        Ok(Self {
            dimension: Some(dimension),
            entries,
            next_id,
        })
    }

    /// Embedding dimension, if any entry has been inserted.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in ascending id order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub(crate) fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Append chunks with their vectors.
    ///
    /// All inputs are validated before anything is written, so a failed call
    /// leaves the index exactly as it was.
    pub fn insert(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> RagResult<Vec<EntryId>> {
        if chunks.len() != vectors.len() {
            return Err(RagError::Validation(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.dimension.unwrap_or(vectors[0].len());
        if expected == 0 {
            return Err(RagError::Validation("empty embedding vector".to_string()));
        }

        for vector in &vectors {
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(RagError::Validation(
                    "embedding vector has a non-finite component".to_string(),
                ));
            }
        }

        let first = self.next_id;
        let next_id = u32::try_from(chunks.len())
            .ok()
            .and_then(|count| first.checked_add(count))
            .ok_or_else(|| RagError::Validation("entry id space exhausted".to_string()))?;

        let ids: Vec<EntryId> = (first..next_id).filter_map(EntryId::new).collect();

        self.dimension = Some(expected);
        self.entries.extend(
            ids.iter()
                .zip(chunks.into_iter().zip(vectors))
                .map(|(&id, (chunk, vector))| IndexEntry { id, chunk, vector }),
        );
        self.next_id = next_id;

        tracing::debug!(
            target: "vector",
            "inserted {} entries (ids {first}..{next_id}), total {}",
            ids.len(),
            self.entries.len()
        );

        Ok(ids)
    }

    /// Rank entries by cosine similarity to `query`, best first.
    ///
    /// `k` is clamped to the number of entries. Equal scores keep ascending id
    /// order.
    pub fn search(&self, query: &[f32], k: usize) -> RagResult<Vec<SearchHit>> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(RagError::Validation(
                "query vector has a non-finite component".to_string(),
            ));
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        // Positions are in id order, so sorting by position breaks ties by id
        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (cosine_similarity(query, &entry.vector), pos))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, pos)| {
                let entry = &self.entries[pos];
                SearchHit {
                    id: entry.id,
                    chunk: entry.chunk.clone(),
                    score,
                }
            })
            .collect())
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.entries.len(),
            dimension: self.dimension,
        }
    }

    /// Drop everything inserted after `checkpoint`. Ids stay consumed.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(checkpoint.len);
        self.dimension = checkpoint.dimension;
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
