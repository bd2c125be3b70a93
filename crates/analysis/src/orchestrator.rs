use crate::error::Result;
use crate::response_log::ResponseLog;
use crate::summary::{Summarize, TruncatingSummarizer};
use serde_json::Value;
use voynich_services::ReasoningClient;

/// Fallback key used when a reasoning reply is not valid JSON
pub const RAW_RESPONSE_KEY: &str = "raw_response";

/// Drives single-shot analysis calls and multi-round recursive
/// refinement over the shared response log.
///
/// Rounds are strictly sequential: each one re-reads the complete log
/// from disk before building its prompt, so round `i + 1` always sees
/// round `i`'s append and the run survives process restarts between
/// rounds.
pub struct RefinementOrchestrator {
    client: Box<dyn ReasoningClient>,
    log: ResponseLog,
    summarizer: Box<dyn Summarize>,
}

impl RefinementOrchestrator {
    #[must_use]
    pub fn new(client: Box<dyn ReasoningClient>, log: ResponseLog) -> Self {
        Self {
            client,
            log,
            summarizer: Box::new(TruncatingSummarizer::default()),
        }
    }

    /// Replace the summarization strategy used by refinement rounds
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarize>) -> Self {
        self.summarizer = summarizer;
        self
    }

    #[must_use]
    pub fn log(&self) -> &ResponseLog {
        &self.log
    }

    /// Submit one rendered prompt and append the exchange to the log.
    ///
    /// A reply that fails to parse as JSON is wrapped under
    /// `raw_response` rather than discarded; the exchange is logged
    /// either way.
    pub async fn analyze(&self, prompt: &str) -> Result<Value> {
        let reply = self.client.complete(prompt).await?;
        let parsed = parse_reply(&reply);
        self.log.append(prompt, &parsed).await?;
        Ok(parsed)
    }

    /// Run exactly `rounds` refinement rounds and return the final
    /// round's raw reply text.
    ///
    /// There is no convergence test: the loop always performs the
    /// requested number of rounds, and a malformed reply in one round
    /// degrades to the raw-text fallback without aborting the rest.
    pub async fn refine(&self, rounds: usize) -> Result<String> {
        let mut final_reply = String::new();
        for round in 0..rounds {
            let responses = self.log.read_responses().await?;
            let summary = self.summarizer.summarize(&responses);
            let prompt = refinement_prompt(&summary);

            log::info!("Refinement round {}/{rounds}", round + 1);
            let reply = self.client.complete(&prompt).await?;
            let parsed = parse_reply(&reply);
            self.log.append(&prompt, &parsed).await?;
            final_reply = reply;
        }
        Ok(final_reply)
    }
}

/// Parse a reasoning reply as JSON, wrapping unparseable text under the
/// fallback key
#[must_use]
pub fn parse_reply(reply: &str) -> Value {
    serde_json::from_str(reply)
        .unwrap_or_else(|_| serde_json::json!({ RAW_RESPONSE_KEY: reply }))
}

/// The fixed refinement prompt wrapped around the bounded history
#[must_use]
pub fn refinement_prompt(summary: &str) -> String {
    format!(
        "You are refining your understanding of the structure and function of tokens in an undeciphered manuscript.\n\n\
         Previous hypotheses and analyses:\n{summary}\n\n\
         TASK:\n\
         - Reflect on these hypotheses.\n\
         - Identify patterns, contradictions, or recurring structural cues.\n\
         - Propose a unified theory about the grammar or symbolic logic of these tokens.\n\
         - Include possible token roles (prefixes, suffixes, delimiters), grammatical markers, or positional patterns.\n\
         - Output in JSON with fields: \"updated_hypothesis\", \"evidence_summary\", and \"confidence\".\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_reply_is_parsed() {
        let parsed = parse_reply(r#"{"confidence": 0.8}"#);
        assert_eq!(parsed["confidence"], 0.8);
    }

    #[test]
    fn test_invalid_reply_is_wrapped_not_dropped() {
        let parsed = parse_reply("The tokens appear to share prefixes.");
        assert_eq!(
            parsed[RAW_RESPONSE_KEY],
            "The tokens appear to share prefixes."
        );
    }

    #[test]
    fn test_refinement_prompt_embeds_summary() {
        let prompt = refinement_prompt("[{\"hypothesis\":\"x\"}]");
        assert!(prompt.contains("[{\"hypothesis\":\"x\"}]"));
        assert!(prompt.contains("updated_hypothesis"));
    }
}
