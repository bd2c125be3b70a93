use rand::Rng;

/// Scores how close an analysis unit sits to a reference corpus.
///
/// The payload shape is identical whichever implementation is injected,
/// so the random stand-in can be swapped for a real embedding-distance
/// computation without touching the assembler.
pub trait SimilarityProvider: Send + Sync {
    fn score(&self, unit_embedding: &[f32], reference_embedding: &[f32]) -> f32;
}

/// Stand-in provider: an independent uniform score per call.
///
/// Explicitly not a real similarity metric; it exists so payloads carry a
/// numeric hint while the embedding pipeline is still external.
#[derive(Debug, Default)]
pub struct RandomSimilarity;

impl SimilarityProvider for RandomSimilarity {
    fn score(&self, _unit_embedding: &[f32], _reference_embedding: &[f32]) -> f32 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Cosine similarity over externally supplied embedding vectors
#[derive(Debug, Default)]
pub struct CosineSimilarity;

impl SimilarityProvider for CosineSimilarity {
    fn score(&self, unit_embedding: &[f32], reference_embedding: &[f32]) -> f32 {
        let n = unit_embedding.len().min(reference_embedding.len());
        if n == 0 {
            return 0.0;
        }
        let dot: f32 = unit_embedding[..n]
            .iter()
            .zip(&reference_embedding[..n])
            .map(|(a, b)| a * b)
            .sum();
        let norm_a: f32 = unit_embedding[..n].iter().map(|a| a * a).sum::<f32>().sqrt();
        let norm_b: f32 = reference_embedding[..n]
            .iter()
            .map(|b| b * b)
            .sum::<f32>()
            .sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}
