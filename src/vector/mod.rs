//! Exact nearest-neighbour index over chunk embeddings.

mod index;
mod types;

pub use index::{VectorIndex, cosine_similarity};
pub use types::{EntryId, IndexEntry, SearchHit};
