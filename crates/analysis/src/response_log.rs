use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One prompt/response exchange in the response log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub prompt: String,
    pub response: Value,
}

/// Append-only JSONL log of every analysis exchange.
///
/// The log is the sole durable memory of all analysis rounds: it is
/// never truncated or rewritten, only appended to, and every reader
/// re-reads it from disk so a restart between rounds loses nothing.
#[derive(Debug, Clone)]
pub struct ResponseLog {
    path: PathBuf,
}

impl ResponseLog {
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

    /// Append one exchange as a single JSON line
    pub async fn append(&self, prompt: &str, response: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let entry = LogEntry {
            prompt: prompt.to_string(),
            response: response.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Re-read every entry from the start of the log, skipping lines
    /// that fail to parse
    pub async fn read_entries(&self) -> Result<Vec<LogEntry>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalysisError::NotFound(self.path.clone())
            } else {
                AnalysisError::IoError(e)
            }
        })?;

        let mut entries = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!(
                    "Skipping malformed response-log line in {}: {e}",
                    self.path.display()
                ),
            }
        }
        Ok(entries)
    }

    /// All prior responses, oldest first
    pub async fn read_responses(&self) -> Result<Vec<Value>> {
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .map(|entry| entry.response)
            .collect())
    }

    /// The most recent `max` entries, newest first
    pub async fn recent(&self, max: usize) -> Result<Vec<LogEntry>> {
        let mut entries = self.read_entries().await?;
        let keep = entries.len().saturating_sub(max);
        let mut recent = entries.split_off(keep);
        recent.reverse();
        Ok(recent)
    }
}
