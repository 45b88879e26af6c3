pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod generation;
pub mod logging;
pub mod retrieve;
pub mod semantic;
#[cfg(feature = "http-server")]
pub mod server;
pub mod storage;
pub mod vector;

pub use config::Settings;
pub use documents::{Chunk, ChunkMetadata, Chunker, ChunkingConfig, RecursiveChunker, split};
pub use error::{RagError, RagResult};
pub use generation::{Answer, Generator, HttpGenerator, PromptTemplate, QaPipeline};
pub use retrieve::{IndexStats, IngestReport, Retriever};
pub use semantic::{Embedder, FastEmbedder, HashEmbedder};
pub use storage::{SnapshotStore, StorageError};
pub use vector::{EntryId, SearchHit, VectorIndex};
