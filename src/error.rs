//! Error types for the Phishguard service.

use thiserror::Error;

/// Main error type for Phishguard operations.
#[derive(Error, Debug)]
pub enum PhishguardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed request input
    #[error("{0}")]
    Validation(String),

    /// Admission was denied by a rate limiter
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the caller should wait before retrying
        retry_after_secs: u64,
    },

    /// A classifier collaborator failed
    #[error("Classification failed: {0}")]
    Classification(String),

    /// A heuristic signal provider failed
    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    /// Preview rendering failed
    #[error("Preview rendering failed: {0}")]
    Preview(String),

    /// Feedback or audit storage failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for PhishguardError {
    fn from(err: config::ConfigError) -> Self {
        PhishguardError::Config(err.to_string())
    }
}

/// Result type alias for Phishguard operations.
pub type Result<T> = std::result::Result<T, PhishguardError>;
