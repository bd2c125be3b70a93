use crate::error::{Result, TranscriptError};
use crate::record::{Section, SectionVocabulary, TranscriptionRecord};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Folio -> section label mapping, built once per parse pass.
///
/// A folio maps to exactly one label per parse; later declarations for
/// the same folio overwrite earlier ones.
pub type SectionMap = HashMap<String, Section>;

/// Parse a transcription file for one transcriber tag.
///
/// The file is decoded as Latin-1. A missing file is the only fatal
/// condition; malformed rows are skipped with a diagnostic.
pub async fn parse_file(
    path: impl AsRef<Path>,
    transcriber: &str,
    vocabulary: &SectionVocabulary,
) -> Result<Vec<TranscriptionRecord>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscriptError::NotFound(path.to_path_buf())
        } else {
            TranscriptError::IoError(e)
        }
    })?;
    let content = decode_latin1(&bytes);
    Ok(parse_records(&content, transcriber, vocabulary))
}

/// Parse transcription content already in memory.
///
/// Pass 1 collects folio/section declarations; pass 2 extracts the rows
/// matching the requested transcriber tag.
#[must_use]
pub fn parse_records(
    content: &str,
    transcriber: &str,
    vocabulary: &SectionVocabulary,
) -> Vec<TranscriptionRecord> {
    let section_map = build_section_map(content, vocabulary);

    let prefix_pattern = Regex::new(r"^<([^;>]+);([^>]+)>").expect("valid prefix regex");
    let tag_marker = format!(";{transcriber}>");

    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !line.starts_with('<') || !line.contains(&tag_marker) {
            continue;
        }

        let Some(caps) = prefix_pattern.captures(line) else {
            log::debug!("Skipping malformed transcription row: {line}");
            continue;
        };
        let locator = &caps[1];
        let tx_id = caps[2].to_string();

        // Locator format is page.paragraph.row
        let mut parts = locator.split('.');
        let (Some(page), Some(paragraph), Some(row), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            log::debug!("Skipping row with malformed locator: {locator}");
            continue;
        };

        // Everything after the first '>' is the raw transcription
        let Some((_, raw)) = line.split_once('>') else {
            continue;
        };

        // Line-continuation dots are format filler, not text
        let cleaned = raw.trim().replace('.', " ");
        let tokens: Vec<String> = cleaned
            .split_whitespace()
            .map(|w| w.trim_end_matches('-').trim_end_matches('?').to_string())
            .collect();

        let section = section_map.get(page).copied().unwrap_or_default();

        records.push(TranscriptionRecord {
            page: page.to_string(),
            paragraph: paragraph.to_string(),
            row: row.to_string(),
            transcriber: tx_id,
            section,
            raw: cleaned,
            tokens,
        });
    }

    log::info!("Parsed {} rows for transcriber '{transcriber}'", records.len());
    records
}

/// Scan every line for folio/section declarations (`<folio> {$I=C`)
#[must_use]
pub fn build_section_map(content: &str, vocabulary: &SectionVocabulary) -> SectionMap {
    let section_pattern = Regex::new(r"<([^>]+)>\s*\{\$I=([A-Z])").expect("valid section regex");

    let mut mapping = SectionMap::new();
    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with('<') || !line.contains("{$I=") {
            continue;
        }
        if let Some(caps) = section_pattern.captures(line) {
            let folio = caps[1].to_string();
            let code = caps[2].chars().next().expect("single-letter code");
            mapping.insert(folio, vocabulary.classify(code));
        }
    }
    mapping
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
