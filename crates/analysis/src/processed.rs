use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The persisted set of already-analyzed section identifiers.
///
/// Grows monotonically within a session and survives restarts. Every
/// change is written back to disk as a whole-file rewrite before the
/// mutating call returns.
#[derive(Debug)]
pub struct ProcessedSet {
    path: PathBuf,
    ids: HashSet<String>,
}

impl ProcessedSet {
    /// Load the set from disk; a missing file yields an empty set
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ids = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Vec<String>>(&content)?
                .into_iter()
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, ids })
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record an identifier; the caller persists when the batch is done
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Write the whole set back to disk (temp file + rename)
    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        let content = serde_json::to_string_pretty(&ids)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("Persisted {} processed ids to {}", ids.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = ProcessedSet::load(dir.path().join("absent.json")).await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_sections.json");

        let mut set = ProcessedSet::load(&path).await.unwrap();
        for id in ["f1r::P1", "f1r::P2", "f2v::P1"] {
            set.insert(id);
        }
        set.persist().await.unwrap();

        let reloaded = ProcessedSet::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), 3);
        for id in ["f1r::P1", "f1r::P2", "f2v::P1"] {
            assert!(reloaded.contains(id));
        }
    }
}
