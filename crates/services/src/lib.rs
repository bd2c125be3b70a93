//! # Voynich Services
//!
//! Thin HTTP clients for the two external collaborators of the analysis
//! pipeline: the embedding service and the reasoning (LLM) service.
//!
//! Both are pass-through interfaces with no logic of their own beyond
//! status checking, reply-shape validation and request timeouts. A hung
//! call surfaces as a timeout error instead of blocking forever.

mod embedder;
mod error;
mod reasoning;

pub use embedder::EmbedderClient;
pub use error::{Result, ServiceError};
pub use reasoning::{ChatClient, LocalLlmClient, ReasoningClient};
