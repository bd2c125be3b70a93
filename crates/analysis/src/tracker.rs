use crate::embeddings::{load_embeddings, EmbeddingRecord};
use crate::error::{AnalysisError, Result};
use crate::processed::ProcessedSet;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Tracks which analysis units have already been submitted for analysis.
///
/// Owns the full embedding-record collection (loaded once) and the
/// persisted processed set. Selection never marks an identifier as
/// processed; that happens when payloads are built for it.
pub struct SectionTracker {
    embeddings: Vec<EmbeddingRecord>,
    processed: ProcessedSet,
}

impl SectionTracker {
    pub async fn new(
        embeddings_path: impl AsRef<Path>,
        processed_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let embeddings = load_embeddings(embeddings_path).await?;
        let processed = ProcessedSet::load(processed_path).await?;
        Ok(Self {
            embeddings,
            processed,
        })
    }

    /// Select `n` distinct section identifiers at random, without
    /// replacement. With `include_processed` false the pool is restricted
    /// to identifiers not yet marked processed.
    pub fn choose(&self, n: usize, include_processed: bool) -> Result<Vec<String>> {
        self.choose_with_rng(n, include_processed, &mut rand::thread_rng())
    }

    /// `choose` with a caller-supplied RNG (seedable in tests)
    pub fn choose_with_rng<R: Rng + ?Sized>(
        &self,
        n: usize,
        include_processed: bool,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let pool: Vec<String> = self
            .embeddings
            .iter()
            .map(EmbeddingRecord::section_id)
            .filter(|id| include_processed || !self.processed.contains(id))
            .collect();

        if pool.len() < n {
            return Err(AnalysisError::InsufficientPool {
                available: pool.len(),
                requested: n,
            });
        }
        Ok(pool.choose_multiple(rng, n).cloned().collect())
    }

    /// Resolve an identifier back to its originating record
    pub fn record(&self, id: &str) -> Result<&EmbeddingRecord> {
        let (page, paragraph) = id
            .split_once("::")
            .ok_or_else(|| AnalysisError::UnknownSection(id.to_string()))?;
        self.embeddings
            .iter()
            .find(|rec| rec.page == page && rec.paragraph == paragraph)
            .ok_or_else(|| AnalysisError::UnknownSection(id.to_string()))
    }

    /// Mark an identifier processed in memory; call `persist` to flush
    pub fn mark_processed(&mut self, id: impl Into<String>) {
        self.processed.insert(id);
    }

    /// Flush the processed set to disk
    pub async fn persist(&self) -> Result<()> {
        self.processed.persist().await
    }

    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    #[must_use]
    pub fn embeddings(&self) -> &[EmbeddingRecord] {
        &self.embeddings
    }
}
