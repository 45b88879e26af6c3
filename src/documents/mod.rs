//! Document chunking for retrieval.
//!
//! This module provides:
//! - Boundary-aware chunking with exact overlap
//! - Chunk provenance metadata
//! - Text extraction from uploaded files, including PDF

pub mod chunker;
pub mod config;
pub mod extract;
pub mod types;

pub use chunker::{Chunker, RawChunk, RecursiveChunker, split};
pub use config::ChunkingConfig;
pub use extract::{extract_text, is_pdf};
pub use types::{Chunk, ChunkMetadata};
