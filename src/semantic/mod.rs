//! Text embedding backends.
//!
//! The retrieval core only sees the [`Embedder`] trait; settings pick the
//! concrete backend once at startup.

mod embedder;
mod fastembed_embedder;
mod hash_embedder;

use std::sync::Arc;

pub use embedder::Embedder;
pub use fastembed_embedder::{FastEmbedder, model_to_string, models_dir, parse_model};
pub use hash_embedder::HashEmbedder;

// Re-export key types
pub use fastembed::EmbeddingModel;

use crate::config::{EmbeddingBackend, SemanticSearchConfig};
use crate::error::RagResult;

/// Build the embedder selected in settings.
pub fn from_settings(config: &SemanticSearchConfig) -> RagResult<Arc<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::FastEmbed => Ok(Arc::new(FastEmbedder::from_settings(config)?)),
        EmbeddingBackend::Hashing => Ok(Arc::new(HashEmbedder::new(config.dimension)?)),
    }
}
