//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider credential is missing.
    #[error("embedding provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// API request failed.
    #[error("API request failed ({status}): {message}")]
    ApiRequest { status: u16, message: String },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Request did not complete in time.
    #[error("embedding request timed out")]
    Timeout,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Text is empty or whitespace only.
    #[error("cannot embed empty text")]
    EmptyText,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Coarse classification shared by every error type in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or setup; fatal, not retried.
    Configuration,
    /// Vector length disagrees with the agreed dimension.
    DimensionMismatch,
    /// Upstream embedding or index failure.
    Provider,
    /// Input rejected before any network call.
    Validation,
    /// A requested record does not exist.
    NotFound,
}

impl EmbeddingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderNotConfigured(_) => ErrorKind::Configuration,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::EmptyText => ErrorKind::Validation,
            Self::ApiRequest { .. }
            | Self::InvalidResponse(_)
            | Self::RateLimited { .. }
            | Self::Timeout
            | Self::Serialization(_)
            | Self::Http(_) => ErrorKind::Provider,
        }
    }
}
