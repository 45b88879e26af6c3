//! Document chunking strategies.
//!
//! Provides the `Chunker` trait and a recursive splitter that prefers natural
//! boundaries over hard cuts.

use super::config::ChunkingConfig;
use crate::error::RagResult;

/// A raw chunk before being tagged with document provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Byte range in the source document (start, end).
    pub byte_range: (usize, usize),

    /// The text content of this chunk.
    pub content: String,
}

impl RawChunk {
    /// Create a new raw chunk.
    pub fn new(byte_range: (usize, usize), content: String) -> Self {
        Self {
            byte_range,
            content,
        }
    }

    /// Get character count.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into chunks.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> RagResult<Vec<RawChunk>>;
}

/// Split `text` into chunks of at most `chunk_size` characters, each
/// repeating the last `overlap` characters of its predecessor.
///
/// Fails with a configuration error unless `overlap < chunk_size`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> RagResult<Vec<String>> {
    let config = ChunkingConfig::new(chunk_size, overlap);
    let chunks = RecursiveChunker::new().chunk(text, &config)?;
    Ok(chunks.into_iter().map(|c| c.content).collect())
}

/// Recursive chunker: boundary-aware sliding window.
///
/// Algorithm:
/// 1. If the rest of the text fits in `chunk_size`, emit it and stop
/// 2. Otherwise look for the latest paragraph break in the window, then
///    line break, then sentence end, then word gap
/// 3. Fall back to a hard cut at `chunk_size`
/// 4. Start the next chunk `overlap` characters before the cut
///
/// Nothing is trimmed, so the chunks cover the input exactly once outside
/// the overlap regions.
#[derive(Debug, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker.
    pub fn new() -> Self {
        Self
    }
}

/// Split-point kinds in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
}

impl Boundary {
    const PRIORITY: [Boundary; 4] = [
        Boundary::Paragraph,
        Boundary::Line,
        Boundary::Sentence,
        Boundary::Word,
    ];

    /// Whether cutting right before `chars[pos]` lands on this boundary.
    /// The separator stays with the left chunk.
    fn matches(self, chars: &[char], pos: usize) -> bool {
        let prev = chars[pos - 1];
        match self {
            Self::Paragraph => prev == '\n' && pos >= 2 && chars[pos - 2] == '\n',
            Self::Line => prev == '\n',
            Self::Sentence => {
                prev.is_whitespace() && pos >= 2 && matches!(chars[pos - 2], '.' | '!' | '?')
            }
            Self::Word => prev.is_whitespace(),
        }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> RagResult<Vec<RawChunk>> {
        config.validate()?;

        if content.is_empty() {
            return Ok(Vec::new());
        }

        let chars: Vec<char> = content.chars().collect();
        // offsets[i] is the byte offset of chars[i]; the extra entry marks the end
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = if total - start <= config.chunk_size {
                total
            } else {
                find_cut(&chars, start, config)
            };

            let byte_range = (offsets[start], offsets[end]);
            chunks.push(RawChunk::new(
                byte_range,
                content[byte_range.0..byte_range.1].to_string(),
            ));

            if end == total {
                break;
            }
            start = end - config.overlap;
        }

        tracing::debug!(
            target: "chunker",
            "split {total} chars into {} chunks (size {}, overlap {})",
            chunks.len(),
            config.chunk_size,
            config.overlap
        );

        Ok(chunks)
    }
}

/// Pick the end (exclusive, in chars) of the chunk starting at `start`.
///
/// The chunk must be longer than the overlap so the next one starts later.
fn find_cut(chars: &[char], start: usize, config: &ChunkingConfig) -> usize {
    let min_end = start + config.overlap + 1;
    let max_end = start + config.chunk_size;

    Boundary::PRIORITY
        .iter()
        .find_map(|boundary| {
            (min_end..=max_end)
                .rev()
                .find(|&pos| boundary.matches(chars, pos))
        })
        .unwrap_or(max_end)
}


#[cfg(test)]
mod property_tests {
    use super::tests::reconstruct;
    use super::*;
    use proptest::prelude::*;

    /// Text dense in paragraph, line, sentence and word boundaries.
    fn boundary_text() -> impl Strategy<Value = String> {
        prop::string::string_regex("[ab \n.!?\u{e9}\u{65e5}]{1,300}").expect("valid regex")
    }

    fn any_text() -> impl Strategy<Value = String> {
        prop_oneof![boundary_text(), any::<String>().prop_filter("non-empty", |s| !s.is_empty())]
    }

    fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
        (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
    }

    proptest! {
        #[test]
        fn chunks_rebuild_the_source(text in any_text(), (size, overlap) in size_and_overlap()) {
            let chunks = split(&text, size, overlap).unwrap();
            prop_assert!(!chunks.is_empty());
            prop_assert_eq!(reconstruct(&chunks, overlap), text);
        }

        #[test]
        fn chunks_fit_and_share_exact_overlap(
            text in any_text(),
            (size, overlap) in size_and_overlap(),
        ) {
            let chunks = split(&text, size, overlap).unwrap();

            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= size);
            }
            for pair in chunks.windows(2) {
                let previous: Vec<char> = pair[0].chars().collect();
                let tail: String = previous[previous.len() - overlap..].iter().collect();
                prop_assert!(
                    pair[1].starts_with(&tail),
                    "chunk {:?} does not start with {:?}",
                    pair[1],
                    tail
                );
            }
        }
    }
}
