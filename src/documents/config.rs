//! Configuration types for document chunking.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, RagResult};

/// Configuration for document chunking.
///
/// Both values are measured in characters (Unicode scalar values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size. Larger spans are split at the best boundary.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Trailing characters of each chunk repeated at the start of the next.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RagResult<()> {
        if self.overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "overlap ({}) must be less than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_config_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.overlap, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunking_config_validation() {
        assert!(ChunkingConfig::new(10, 9).validate().is_ok());
        assert!(ChunkingConfig::new(10, 0).validate().is_ok());

        // Invalid: overlap == chunk_size
        let err = ChunkingConfig::new(10, 10).validate().unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));

        // Invalid: zero chunk size can never hold any overlap
        assert!(ChunkingConfig::new(0, 0).validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: ChunkingConfig = toml::from_str("chunk_size = 500").unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.overlap, 200);
    }
}
