//! Core types for document chunks.

use serde::{Deserialize, Serialize};

/// Provenance of a chunk within its source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the document the chunk was cut from.
    pub source_document_id: String,

    /// 0-based position of the chunk within the document.
    pub sequence_index: u32,
}

/// A contiguous piece of a source document, tagged with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text content of this chunk.
    pub text: String,

    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(
        text: impl Into<String>,
        source_document_id: impl Into<String>,
        sequence_index: u32,
    ) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source_document_id: source_document_id.into(),
                sequence_index,
            },
        }
    }

    /// Tag a document's chunk texts with contiguous sequence indices.
    pub fn from_texts<I, S>(document_id: &str, texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Self::new(text, document_id, i as u32))
            .collect()
    }

    /// Get a preview of the content (first N characters).
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    /// Get the length of the content in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_texts_assigns_contiguous_indices() {
        let chunks = Chunk::from_texts("A", ["the cat sat", "sat on the mat"]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.source_document_id, "A");
        assert_eq!(chunks[0].metadata.sequence_index, 0);
        assert_eq!(chunks[1].metadata.sequence_index, 1);
        assert_eq!(chunks[1].text, "sat on the mat");
    }

    #[test]
    fn test_chunk_preview() {
        let chunk = Chunk::new("Hello, wörld! This is a test.", "doc", 0);
        assert_eq!(chunk.preview(5), "Hello");
        assert_eq!(chunk.preview(9), "Hello, wö");
        assert_eq!(chunk.preview(100), chunk.text);
    }

    #[test]
    fn test_metadata_serialization() {
        let chunk = Chunk::new("text", "notes.md", 3);
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["metadata"]["source_document_id"], "notes.md");
        assert_eq!(json["metadata"]["sequence_index"], 3);
    }
}
