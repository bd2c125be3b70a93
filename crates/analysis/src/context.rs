use crate::error::{AnalysisError, Result};
use crate::similarity::SimilarityProvider;
use crate::tracker::SectionTracker;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Characters kept from the first record of each reference corpus
const REFERENCE_EXCERPT_CHARS: usize = 200;

/// Tokens shown in the structural notes
const NOTE_TOKEN_COUNT: usize = 10;

/// Characters of raw text shown in the structural notes
const NOTE_RAW_CHARS: usize = 50;

/// A fully rendered analysis request for one section
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPayload {
    pub id: String,
    pub prompt: String,
}

/// A short fixed-length excerpt of one reference corpus, with the
/// corpus embedding when the reference file carries one
#[derive(Debug, Clone)]
pub struct ReferenceExcerpt {
    pub excerpt: String,
    pub embedding: Vec<f32>,
}

/// Reference-language excerpts, loaded once at construction by reading
/// the first record of each reference file
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    references: BTreeMap<String, ReferenceExcerpt>,
}

impl ReferenceLibrary {
    pub async fn load(paths: &BTreeMap<String, PathBuf>) -> Result<Self> {
        let mut references = BTreeMap::new();
        for (language, path) in paths {
            references.insert(language.clone(), load_excerpt(path).await?);
        }
        Ok(Self { references })
    }

    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.references.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

async fn load_excerpt(path: &Path) -> Result<ReferenceExcerpt> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::NotFound(path.to_path_buf())
        } else {
            AnalysisError::IoError(e)
        }
    })?;
    let first: Value = match content.lines().find(|l| !l.trim().is_empty()) {
        Some(line) => serde_json::from_str(line)?,
        None => Value::Null,
    };
    let excerpt = first
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .chars()
        .take(REFERENCE_EXCERPT_CHARS)
        .collect();
    let embedding = first
        .get("embedding")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect()
        })
        .unwrap_or_default();
    Ok(ReferenceExcerpt { excerpt, embedding })
}

/// Composes the comparison context for chosen sections and renders the
/// analysis prompt.
///
/// Every identifier handed to `build_payloads` is marked processed and
/// the set is persisted before the call returns — mark-on-attempt: a
/// reasoning-service failure after payload construction leaves the id
/// marked even though no analysis completed.
pub struct ContextAssembler {
    references: ReferenceLibrary,
    similarity: Box<dyn SimilarityProvider>,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(references: ReferenceLibrary, similarity: Box<dyn SimilarityProvider>) -> Self {
        Self {
            references,
            similarity,
        }
    }

    /// Build one payload per identifier, marking each processed
    pub async fn build_payloads(
        &self,
        tracker: &mut SectionTracker,
        ids: &[String],
        format_instructions: &str,
    ) -> Result<Vec<AnalysisPayload>> {
        let mut payloads = Vec::with_capacity(ids.len());
        for id in ids {
            let rec = tracker.record(id)?.clone();

            let mut scores: BTreeMap<&str, f64> = BTreeMap::new();
            let mut excerpts: BTreeMap<&str, &str> = BTreeMap::new();
            for (language, reference) in &self.references.references {
                let raw_score = self.similarity.score(&rec.embedding, &reference.embedding);
                scores.insert(language, round4(raw_score));
                excerpts.insert(language, reference.excerpt.as_str());
            }

            let shown_tokens = &rec.tokens[..rec.tokens.len().min(NOTE_TOKEN_COUNT)];
            let raw_excerpt: String = rec.raw.chars().take(NOTE_RAW_CHARS).collect();
            let context = serde_json::json!({
                "A. Embedding Similarity Metrics": scores,
                "B. Reference Language Excerpts": excerpts,
                "C. Structural Notes": [
                    format!("Tokens: {shown_tokens:?}"),
                    format!("Raw excerpt: {raw_excerpt}..."),
                ],
            });

            let prompt = render_template(&context, &rec.raw, format_instructions)?;
            payloads.push(AnalysisPayload {
                id: id.clone(),
                prompt,
            });
            tracker.mark_processed(id.clone());
        }
        tracker.persist().await?;
        log::info!("Built {} analysis payloads", payloads.len());
        Ok(payloads)
    }
}

fn round4(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}

/// Render the fixed analysis prompt around a comparison context
pub fn render_template(context: &Value, section_text: &str, format_instructions: &str) -> Result<String> {
    let context_json = serde_json::to_string_pretty(context)?;
    Ok(format!(
        "\nYou are an expert in the structural and statistical analysis of undeciphered scripts.\n\n\
         The following transcriptions are not real words; they are arbitrary Latin letters representing unknown symbols.\n\
         Analyze structural patterns, not linguistic meanings.\n\n\
         ### CONTEXT:\n{context_json}\n\n\
         ### MANUSCRIPT SECTION (TRANSCRIBED TOKENS):\n{section_text}\n\n\
         ### FORMAT_INSTRUCTIONS:\n{format_instructions}\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{CosineSimilarity, RandomSimilarity};
    use pretty_assertions::assert_eq;

    fn write_reference(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let line = serde_json::json!({"text": text, "embedding": [1.0, 0.0]});
        std::fs::write(&path, format!("{line}\n")).unwrap();
        path
    }

    async fn tracker_fixture(dir: &Path) -> SectionTracker {
        let embeddings_path = dir.join("embeddings.jsonl");
        std::fs::write(
            &embeddings_path,
            "{\"page\":\"f1r\",\"paragraph\":\"P1\",\"raw\":\"daiin qokedy chedy\",\
             \"tokens\":[\"daiin\",\"qokedy\",\"chedy\"],\"embedding\":[1.0,0.0]}\n\
             {\"page\":\"f1v\",\"paragraph\":\"P1\",\"raw\":\"otedy\",\"tokens\":[\"otedy\"],\"embedding\":[0.0,1.0]}\n",
        )
        .unwrap();
        SectionTracker::new(&embeddings_path, dir.join("processed.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reference_excerpts_are_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let long_text = "x".repeat(500);
        let paths = BTreeMap::from([(
            "Greek".to_string(),
            write_reference(dir.path(), "greek.jsonl", &long_text),
        )]);
        let library = ReferenceLibrary::load(&paths).await.unwrap();
        assert_eq!(library.references["Greek"].excerpt.len(), 200);
    }

    #[tokio::test]
    async fn test_missing_reference_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = BTreeMap::from([("Greek".to_string(), dir.path().join("absent.jsonl"))]);
        assert!(matches!(
            ReferenceLibrary::load(&paths).await.unwrap_err(),
            AnalysisError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_payload_contains_all_context_sections() {
        let dir = tempfile::tempdir().unwrap();
        let paths = BTreeMap::from([
            (
                "Greek".to_string(),
                write_reference(dir.path(), "greek.jsonl", "en arche en ho logos"),
            ),
            (
                "Hebrew".to_string(),
                write_reference(dir.path(), "hebrew.jsonl", "bereshit bara"),
            ),
        ]);
        let library = ReferenceLibrary::load(&paths).await.unwrap();
        let assembler = ContextAssembler::new(library, Box::new(RandomSimilarity));
        let mut tracker = tracker_fixture(dir.path()).await;

        let ids = vec!["f1r::P1".to_string()];
        let payloads = assembler
            .build_payloads(&mut tracker, &ids, "Return a JSON object.")
            .await
            .unwrap();

        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].id, "f1r::P1");
        let prompt = &payloads[0].prompt;
        assert!(prompt.contains("A. Embedding Similarity Metrics"));
        assert!(prompt.contains("B. Reference Language Excerpts"));
        assert!(prompt.contains("C. Structural Notes"));
        assert!(prompt.contains("en arche en ho logos"));
        assert!(prompt.contains("daiin qokedy chedy"));
        assert!(prompt.contains("Return a JSON object."));
    }

    #[tokio::test]
    async fn test_build_payloads_marks_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let paths = BTreeMap::from([(
            "Greek".to_string(),
            write_reference(dir.path(), "greek.jsonl", "logos"),
        )]);
        let library = ReferenceLibrary::load(&paths).await.unwrap();
        let assembler = ContextAssembler::new(library, Box::new(CosineSimilarity));
        let mut tracker = tracker_fixture(dir.path()).await;

        let ids = vec!["f1r::P1".to_string()];
        assembler
            .build_payloads(&mut tracker, &ids, "json")
            .await
            .unwrap();
        assert_eq!(tracker.processed_count(), 1);

        // A fresh tracker sees the persisted set, and the marked id is
        // excluded from the unprocessed pool.
        let reloaded = SectionTracker::new(
            dir.path().join("embeddings.jsonl"),
            dir.path().join("processed.json"),
        )
        .await
        .unwrap();
        assert_eq!(reloaded.processed_count(), 1);
        let picked = reloaded.choose(1, false).unwrap();
        assert_eq!(picked, vec!["f1v::P1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_id_fails_payload_build() {
        let dir = tempfile::tempdir().unwrap();
        let library = ReferenceLibrary::default();
        let assembler = ContextAssembler::new(library, Box::new(RandomSimilarity));
        let mut tracker = tracker_fixture(dir.path()).await;
        let err = assembler
            .build_payloads(&mut tracker, &["f9r::P9".to_string()], "json")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownSection(_)));
    }
}
