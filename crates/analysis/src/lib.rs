//! # Voynich Analysis
//!
//! The stateful heart of the cross-lingual analysis pipeline.
//!
//! ## Architecture
//!
//! ```text
//! embeddings.jsonl ──> SectionTracker ──choose──> section ids
//!                           │                         │
//!                 processed_sections.json             │
//!                           ▲                         ▼
//!                           └──mark──── ContextAssembler ──> AnalysisPayload
//!                                                               │
//!                                            RefinementOrchestrator
//!                                                │           │
//!                                          reasoning      ResponseLog
//!                                           service      (append-only)
//!                                                │           │
//!                                    round i+1 re-reads the full log
//! ```
//!
//! The response log and the processed-set file are the only mutable
//! shared state. Concurrent writers are not supported; run one
//! orchestrator process at a time.

mod context;
mod cost;
mod embeddings;
mod error;
mod orchestrator;
mod processed;
mod response_log;
mod similarity;
mod summary;
mod tracker;

pub use context::{
    render_template, AnalysisPayload, ContextAssembler, ReferenceExcerpt, ReferenceLibrary,
};
pub use cost::{estimate_refinement_cost, CostEstimate};
pub use embeddings::{load_embeddings, EmbeddingRecord};
pub use error::{AnalysisError, Result};
pub use orchestrator::{parse_reply, refinement_prompt, RefinementOrchestrator, RAW_RESPONSE_KEY};
pub use processed::ProcessedSet;
pub use response_log::{LogEntry, ResponseLog};
pub use similarity::{CosineSimilarity, RandomSimilarity, SimilarityProvider};
pub use summary::{Summarize, TruncatingSummarizer, DEFAULT_SUMMARY_CHARS};
pub use tracker::SectionTracker;
