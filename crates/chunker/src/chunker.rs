use crate::config::ChunkConfig;
use crate::types::{Chunk, ChunkMeta};
use std::collections::HashMap;
use voynich_transcript::TranscriptionRecord;

/// Group transcription records into chunks of `chunk_size` records,
/// strictly within each record's page.
///
/// Pages are emitted in first-appearance order and records keep their
/// input order, so identical input always produces identical output.
#[must_use]
pub fn chunk_records(records: &[TranscriptionRecord], config: &ChunkConfig) -> Vec<Chunk> {
    let mut page_order: Vec<&str> = Vec::new();
    let mut by_page: HashMap<&str, Vec<&TranscriptionRecord>> = HashMap::new();
    for rec in records {
        let entry = by_page.entry(rec.page.as_str()).or_default();
        if entry.is_empty() {
            page_order.push(rec.page.as_str());
        }
        entry.push(rec);
    }

    let mut chunks = Vec::new();
    for page in page_order {
        for window in by_page[page].chunks(config.chunk_size) {
            let text = window
                .iter()
                .map(|rec| rec.raw.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let metadata = window.iter().map(|rec| ChunkMeta::from_record(rec)).collect();
            chunks.push(Chunk {
                page: page.to_string(),
                metadata,
                text,
            });
        }
    }

    log::info!(
        "Chunked {} records into {} chunks (size {})",
        records.len(),
        chunks.len(),
        config.chunk_size
    );
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use voynich_transcript::{parse_records, Section, SectionVocabulary};

    fn record(page: &str, row: usize, text: &str) -> TranscriptionRecord {
        TranscriptionRecord {
            page: page.to_string(),
            paragraph: "P1".to_string(),
            row: row.to_string(),
            transcriber: "H".to_string(),
            section: Section::Unknown,
            raw: text.to_string(),
            tokens: text.split_whitespace().map(String::from).collect(),
        }
    }

    fn config(chunk_size: usize) -> ChunkConfig {
        ChunkConfig {
            chunk_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_chunks_never_span_pages() {
        let records = vec![
            record("f1r", 1, "a"),
            record("f1r", 2, "b"),
            record("f1v", 1, "c"),
        ];
        let chunks = chunk_records(&records, &config(5));
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            for meta in &chunk.metadata {
                let ChunkMeta::Row { page, .. } = meta else {
                    panic!("expected row metadata");
                };
                assert_eq!(page, &chunk.page);
            }
        }
    }

    #[test]
    fn test_window_sizes_and_text_join() {
        let records: Vec<_> = (1..=7).map(|i| record("f1r", i, &format!("w{i}"))).collect();
        let chunks = chunk_records(&records, &config(3));
        assert_eq!(
            chunks.iter().map(Chunk::len).collect::<Vec<_>>(),
            vec![3, 3, 1]
        );
        assert_eq!(chunks[0].text, "w1 w2 w3");
        assert_eq!(chunks[2].text, "w7");
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let records: Vec<_> = (1..=12)
            .map(|i| record(if i % 3 == 0 { "f2r" } else { "f1r" }, i, "tok"))
            .collect();
        let a = chunk_records(&records, &config(4));
        let b = chunk_records(&records, &config(4));
        assert_eq!(a, b);
    }

    // Fixture-driven end-to-end property: per-page chunk sizes sum to the
    // per-page record count.
    #[test]
    fn test_per_page_sizes_sum_to_record_counts() {
        let mut fixture = String::from("<f1r> {$I=H\n<f1v> {$I=A\n");
        for i in 1..=12 {
            fixture.push_str(&format!("<f1r.P1.{i};H> tok{i}.tok\n"));
        }
        let records = parse_records(&fixture, "H", &SectionVocabulary::default());
        assert_eq!(records.len(), 12);

        let chunks = chunk_records(&records, &config(5));
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().map(Chunk::len).collect::<Vec<_>>(),
            vec![5, 5, 2]
        );

        let mut per_page: HashMap<&str, usize> = HashMap::new();
        for chunk in &chunks {
            *per_page.entry(chunk.page.as_str()).or_default() += chunk.len();
        }
        let mut expected: HashMap<&str, usize> = HashMap::new();
        for rec in &records {
            *expected.entry(rec.page.as_str()).or_default() += 1;
        }
        assert_eq!(per_page, expected);
    }
}
