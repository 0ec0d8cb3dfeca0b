//! Error types for critique

use thiserror::Error;

/// Result type alias for critique operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for critique operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP-level error talking to the remote model
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote model transport failure after exhausting retries
    ///
    /// This is the only error that terminates a review without a
    /// review-shaped result.
    #[error("Model transport error: {0}")]
    Transport(String),

    /// Remote model returned a response the protocol layer cannot interpret
    #[error("Model protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
