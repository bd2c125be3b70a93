use thiserror::Error;

/// Result type for service-client operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors talking to the external embedding and reasoning services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Network-level failure (connect, timeout, body read)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The reply did not have the expected shape
    #[error("Malformed service reply: {0}")]
    MalformedReply(String),
}
