use crate::error::{ChunkerError, Result};
use crate::types::Chunk;
use std::path::{Path, PathBuf};

/// JSONL persistence for analysis units.
///
/// Written by the chunker, read back when selecting units for analysis.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    path: PathBuf,
}

impl ChunkStore {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save chunks, one JSON object per line. The write goes through a
    /// temp file and rename so a crash never leaves a half-written store.
    pub async fn save(&self, chunks: &[Chunk]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&serde_json::to_string(chunk)?);
            out.push('\n');
        }
        let tmp = self.path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, out).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::info!("Saved {} chunks to {}", chunks.len(), self.path.display());
        Ok(())
    }

    /// Load chunks, skipping unparseable lines with a warning
    pub async fn load(&self) -> Result<Vec<Chunk>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChunkerError::NotFound(self.path.clone())
            } else {
                ChunkerError::IoError(e)
            }
        })?;

        let mut chunks = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Chunk>(line) {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => log::warn!(
                    "Skipping malformed chunk line in {}: {e}",
                    self.path.display()
                ),
            }
        }
        log::info!("Loaded {} chunks from {}", chunks.len(), self.path.display());
        Ok(chunks)
    }
}
