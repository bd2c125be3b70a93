use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for grouping records into analysis units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Number of records per chunk (hard window, last window may be short)
    pub chunk_size: usize,

    /// Maximum characters per source text before it is sub-split into
    /// numbered sections (corpus mode only)
    pub max_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            max_chars: 1000,
        }
    }
}

impl ChunkConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }
        if self.max_chars == 0 {
            return Err(ChunkerError::invalid_config("max_chars must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ChunkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ChunkConfig::default();

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config.chunk_size = 5;
        config.max_chars = 0;
        assert!(config.validate().is_err());

        config.max_chars = 1000;
        assert!(config.validate().is_ok());
    }
}
