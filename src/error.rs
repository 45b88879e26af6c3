//! Error taxonomy shared by the retrieval core.
//!
//! Chunker, embedder, and index errors propagate unchanged through the
//! [`Retriever`](crate::retrieve::Retriever) to the API layer, which decides
//! how to present them.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid chunking parameters or settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input rejected before any state was touched.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding or generation backend could not be loaded or reached.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Failed to generate embedding: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RagError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::Embedding(_) => "embedding",
            Self::Generation(_) => "generation",
            Self::Storage(_) => "storage",
        }
    }
}

pub type RagResult<T> = Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(RagError::Configuration("x".into()).kind(), "configuration");
        assert_eq!(
            RagError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
            .kind(),
            "dimension_mismatch"
        );
        let io = std::io::Error::other("disk full");
        assert_eq!(RagError::from(StorageError::from(io)).kind(), "storage");
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = RagError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Vector dimension mismatch: expected 384, got 768"
        );
    }
}
