use serde_json::Value;

/// Default character cap for the serialized response history
pub const DEFAULT_SUMMARY_CHARS: usize = 10_000;

/// Bounds the serialized prior-response history for a refinement round.
///
/// The orchestrator's round-stepping only depends on this interface, so
/// the naive truncation strategy can be replaced by a smarter summarizer
/// without touching the loop.
pub trait Summarize: Send + Sync {
    fn summarize(&self, responses: &[Value]) -> String;
}

/// Serializes all prior responses and hard-cuts at a character cap.
///
/// The cut keeps the oldest content and ignores semantic boundaries, so
/// it can split a JSON-like response mid-token. That matches the
/// long-standing behavior of the refinement loop and is kept
/// deliberately; swap in another `Summarize` implementation for
/// boundary-aware summaries.
#[derive(Debug, Clone)]
pub struct TruncatingSummarizer {
    max_chars: usize,
}

impl TruncatingSummarizer {
    #[must_use]
    pub const fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for TruncatingSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARY_CHARS)
    }
}

impl Summarize for TruncatingSummarizer {
    fn summarize(&self, responses: &[Value]) -> String {
        let serialized =
            serde_json::to_string(responses).unwrap_or_else(|_| "[]".to_string());
        serialized.chars().take(self.max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_history_passes_through() {
        let responses = vec![serde_json::json!({"hypothesis": "prefix marker"})];
        let summary = TruncatingSummarizer::default().summarize(&responses);
        assert_eq!(summary, r#"[{"hypothesis":"prefix marker"}]"#);
    }

    #[test]
    fn test_truncation_keeps_oldest_content() {
        let responses: Vec<Value> = (0..50)
            .map(|i| serde_json::json!({"round": i, "text": "x".repeat(100)}))
            .collect();
        let summary = TruncatingSummarizer::new(300).summarize(&responses);
        assert_eq!(summary.chars().count(), 300);
        // Oldest response survives, newest is cut away.
        assert!(summary.contains("\"round\":0"));
        assert!(!summary.contains("\"round\":49"));
    }
}
