use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An externally produced embedding record.
///
/// Consumed, never produced, by this crate; everything beyond the
/// identity fields is treated as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub page: String,
    pub paragraph: String,

    #[serde(default)]
    pub tokens: Vec<String>,

    #[serde(default)]
    pub raw: String,

    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl EmbeddingRecord {
    /// Section identifier of the form `page::paragraph`
    #[must_use]
    pub fn section_id(&self) -> String {
        format!("{}::{}", self.page, self.paragraph)
    }
}

/// Load embedding records from a JSONL file.
///
/// A missing file is fatal; unparseable lines are skipped with a warning.
pub async fn load_embeddings(path: impl AsRef<Path>) -> Result<Vec<EmbeddingRecord>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::NotFound(path.to_path_buf())
        } else {
            AnalysisError::IoError(e)
        }
    })?;

    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<EmbeddingRecord>(line) {
            Ok(rec) => records.push(rec),
            Err(e) => log::warn!(
                "Skipping malformed embedding line in {}: {e}",
                path.display()
            ),
        }
    }
    log::info!("Loaded {} embedding records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_shape() {
        let rec = EmbeddingRecord {
            page: "f1r".to_string(),
            paragraph: "P2".to_string(),
            tokens: vec![],
            raw: String::new(),
            embedding: vec![],
        };
        assert_eq!(rec.section_id(), "f1r::P2");
    }

    #[tokio::test]
    async fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.jsonl");
        std::fs::write(
            &path,
            "{\"page\":\"f1r\",\"paragraph\":\"P1\",\"raw\":\"daiin\"}\nnot json\n",
        )
        .unwrap();
        let records = load_embeddings(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section_id(), "f1r::P1");
    }

    #[tokio::test]
    async fn test_missing_embeddings_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_embeddings(dir.path().join("absent.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound(_)));
    }
}
