use std::path::PathBuf;
use thiserror::Error;
use voynich_services::ServiceError;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while tracking, assembling and refining analyses
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Required input file is absent
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// A sampling request exceeded the eligible population
    #[error("Not enough sections available ({available}) for selection of {requested} sections")]
    InsufficientPool { available: usize, requested: usize },

    /// A section identifier does not resolve to any loaded record
    #[error("Unknown section identifier: {0}")]
    UnknownSection(String),

    /// Failure talking to an external service
    #[error("Service failure: {0}")]
    Service(#[from] ServiceError),

    /// Tokenizer could not be constructed
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
