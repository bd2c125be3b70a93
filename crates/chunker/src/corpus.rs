use crate::config::ChunkConfig;
use crate::error::{ChunkerError, Result};
use crate::types::{Chunk, ChunkMeta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One line of a reference-corpus JSONL file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub language: String,
    pub source: String,
    pub text: String,

    /// Produced by the chunker when a text is sub-split; not required on
    /// input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Cut a text into consecutive sections of at most `max_chars` characters.
///
/// The cut is a hard character boundary with no word awareness; each
/// section is whitespace-trimmed at its edges. An empty text still yields
/// one (empty) section.
#[must_use]
pub fn split_text_sections(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let num_parts = chars.len().div_ceil(max_chars).max(1);
    (0..num_parts)
        .map(|i| {
            let start = i * max_chars;
            let end = (start + max_chars).min(chars.len());
            chars[start..end]
                .iter()
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}

/// Chunk flat corpus records on a character budget, then group the
/// resulting sub-records into windows of `chunk_size` within each
/// language.
///
/// Oversized texts become sequentially numbered sections ("1", "2", ...)
/// before grouping, so no chunk's text exceeds
/// `chunk_size * max_chars` characters and no chunk mixes two languages.
#[must_use]
pub fn chunk_corpus(records: &[CorpusRecord], config: &ChunkConfig) -> Vec<Chunk> {
    let mut expanded: Vec<CorpusRecord> = Vec::new();
    for rec in records {
        for (i, part) in split_text_sections(&rec.text, config.max_chars)
            .into_iter()
            .enumerate()
        {
            expanded.push(CorpusRecord {
                language: rec.language.clone(),
                source: rec.source.clone(),
                text: part,
                section: Some((i + 1).to_string()),
            });
        }
    }

    let mut lang_order: Vec<&str> = Vec::new();
    let mut by_lang: HashMap<&str, Vec<&CorpusRecord>> = HashMap::new();
    for rec in &expanded {
        let entry = by_lang.entry(rec.language.as_str()).or_default();
        if entry.is_empty() {
            lang_order.push(rec.language.as_str());
        }
        entry.push(rec);
    }

    let mut chunks = Vec::new();
    for language in lang_order {
        for window in by_lang[language].chunks(config.chunk_size) {
            let text = window
                .iter()
                .map(|rec| rec.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let metadata = window
                .iter()
                .map(|rec| ChunkMeta::Corpus {
                    language: rec.language.clone(),
                    source: rec.source.clone(),
                    row: String::new(),
                    section: rec.section.clone().unwrap_or_default(),
                })
                .collect();
            chunks.push(Chunk {
                page: language.to_string(),
                metadata,
                text,
            });
        }
    }

    log::info!(
        "Chunked {} corpus records into {} chunks",
        records.len(),
        chunks.len()
    );
    chunks
}

/// Convert a plain text file into corpus records of `lines_per_chunk`
/// joined lines, labeled `<stem>_chunk_<n>`.
///
/// Empty chunks are dropped; embedded newlines and double quotes are
/// flattened to spaces.
pub async fn lines_to_records(
    path: impl AsRef<Path>,
    language: &str,
    lines_per_chunk: usize,
) -> Result<Vec<CorpusRecord>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ChunkerError::NotFound(path.to_path_buf())
        } else {
            ChunkerError::IoError(e)
        }
    })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lines: Vec<&str> = content.lines().map(str::trim).collect();

    let mut records = Vec::new();
    for (idx, group) in lines.chunks(lines_per_chunk.max(1)).enumerate() {
        let text = group.join(" ").trim().to_string();
        if text.is_empty() {
            continue;
        }
        records.push(CorpusRecord {
            language: language.to_string(),
            source: format!("{stem}_chunk_{}", idx + 1),
            text: text.replace('\n', " ").replace('"', " "),
            section: None,
        });
    }

    log::info!(
        "Built {} corpus records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Read corpus records from a JSONL file, skipping unparseable lines
pub async fn read_corpus_jsonl(path: impl AsRef<Path>) -> Result<Vec<CorpusRecord>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ChunkerError::NotFound(path.to_path_buf())
        } else {
            ChunkerError::IoError(e)
        }
    })?;

    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CorpusRecord>(line) {
            Ok(rec) => records.push(rec),
            Err(e) => log::warn!("Skipping malformed corpus line in {}: {e}", path.display()),
        }
    }
    Ok(records)
}

/// Write corpus records as JSONL
pub async fn write_corpus_jsonl(path: impl AsRef<Path>, records: &[CorpusRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut out = String::new();
    for rec in records {
        out.push_str(&serde_json::to_string(rec)?);
        out.push('\n');
    }
    tokio::fs::write(path, out).await?;
    Ok(())
}
