//! Error types for the ContentForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Rewrite failures get their own bounded-context enum because stages
//! must be able to inspect and degrade on them without aborting the pipeline.

use thiserror::Error;

/// The top-level error type for all ContentForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Rewrite capability errors ---
    #[error("Rewrite error: {0}")]
    Rewrite(#[from] RewriteError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Input validation ---
    #[error("The document is empty: add at least one heading or paragraph before optimizing")]
    EmptyDocument,

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the text-rewriting capability.
///
/// None of these are fatal to the pipeline: a stage that receives one keeps
/// the original text and records no rewrite feedback for that element.
#[derive(Debug, Clone, Error)]
pub enum RewriteError {
    #[error("Rewrite service unavailable: {0}")]
    Unavailable(String),

    #[error("Model '{0}' is not enabled for this deployment")]
    UnsupportedModel(String),

    #[error("Upstream request failed: {message} (status: {status_code})")]
    Upstream { status_code: u16, message: String },

    #[error("Rate limited by upstream, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rewrite timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}
