//! Identifier and result types for the vector index.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::documents::{Chunk, ChunkMetadata};

/// Stable identifier of an index entry.
///
/// Assigned at insertion time, strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(NonZeroU32);

impl EntryId {
    /// Create an EntryId from a u32, returning None if zero.
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Get the inner value as u32.
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: EntryId,
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: EntryId,
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1.0, 1.0].
    pub score: f32,
}

impl SearchHit {
    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.chunk.metadata
    }
}

/// Wire shape of a hit: `{text, metadata, score}`.
impl Serialize for SearchHit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("SearchHit", 3)?;
        state.serialize_field("text", &self.chunk.text)?;
        state.serialize_field("metadata", &self.chunk.metadata)?;
        state.serialize_field("score", &self.score)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_zero_returns_none() {
        assert!(EntryId::new(0).is_none());
        assert_eq!(EntryId::new(7).unwrap().get(), 7);
        assert!(EntryId::new(1).unwrap() < EntryId::new(2).unwrap());
    }

    #[test]
    fn test_search_hit_wire_shape() {
        let hit = SearchHit {
            id: EntryId::new(3).unwrap(),
            chunk: Chunk::new("the cat sat", "A", 0),
            score: 0.5,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["text"], "the cat sat");
        assert_eq!(json["metadata"]["source_document_id"], "A");
        assert_eq!(json["metadata"]["sequence_index"], 0);
        assert_eq!(json["score"], 0.5);
        assert!(json.get("id").is_none());
    }
}
