use crate::error::{AnalysisError, Result};
use crate::response_log::ResponseLog;
use serde::Serialize;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

/// Projected token budget for a refinement run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    pub rounds: usize,
    pub input_tokens_per_round: usize,
    pub estimated_output_tokens_per_round: usize,
    pub total_tokens: usize,
}

/// Project the token cost of a refinement run before committing to it.
///
/// Pure with respect to the pipeline's state: the log is only read. The
/// prompt is tokenized with the model's own BPE when the model name is
/// recognized, falling back to `cl100k_base` otherwise.
pub async fn estimate_refinement_cost(
    log: &ResponseLog,
    rounds: usize,
    model: &str,
    output_multiplier: f64,
) -> Result<CostEstimate> {
    let responses = log.read_responses().await?;
    let summary = serde_json::to_string(&responses)?;
    let prompt = format!("Summary of analyses:\n{summary}\nTask: refine the hypothesis.");

    let bpe = tokenizer_for_model(model)?;
    let input_tokens = bpe.encode_with_special_tokens(&prompt).len();
    let estimated_output_tokens = (input_tokens as f64 * output_multiplier) as usize;

    Ok(CostEstimate {
        rounds,
        input_tokens_per_round: input_tokens,
        estimated_output_tokens_per_round: estimated_output_tokens,
        total_tokens: rounds * (input_tokens + estimated_output_tokens),
    })
}

fn tokenizer_for_model(model: &str) -> Result<CoreBPE> {
    match get_bpe_from_model(model) {
        Ok(bpe) => Ok(bpe),
        Err(_) => {
            log::debug!("Unrecognized model '{model}', falling back to cl100k_base");
            cl100k_base().map_err(|e| AnalysisError::Tokenizer(e.to_string()))
        }
    }
}
