use std::path::PathBuf;
use thiserror::Error;

/// Result type for transcript operations
pub type Result<T> = std::result::Result<T, TranscriptError>;

/// Errors that can occur while reading a transcription file
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// Required input file is absent
    #[error("Transcription file not found: {0}")]
    NotFound(PathBuf),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
