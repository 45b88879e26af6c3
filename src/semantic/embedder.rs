//! Embedding provider trait.

use crate::error::{RagError, RagResult};

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be deterministic for a given model and input within
/// one process, and return exactly one vector per input in input order.
pub trait Embedder: Send + Sync {
    /// Model identity, recorded alongside persisted vectors.
    fn model_name(&self) -> &str;

    /// Output dimension of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts.
    fn embed(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>>;

    /// Embed a single text as a one-element batch.
    fn embed_one(&self, text: &str) -> RagResult<Vec<f32>> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("No embedding generated".to_string()))
    }
}

/// Check that a backend returned one vector per input.
pub(crate) fn ensure_batch_len(expected: usize, vectors: &[Vec<f32>]) -> RagResult<()> {
    if vectors.len() != expected {
        return Err(RagError::Embedding(format!(
            "backend returned {} vectors for {expected} inputs",
            vectors.len()
        )));
    }
    Ok(())
}
