//! Error types for vector index operations.

use mentormatch_embeddings::{EmbeddingError, ErrorKind};
use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while talking to a vector index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Missing credential or an index whose schema disagrees with ours.
    #[error("index configuration error: {0}")]
    Configuration(String),

    /// Vector length does not match the index dimension.
    #[error("dimension mismatch for {id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Request rejected before being sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The named index does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Index API returned an error status.
    #[error("index API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response from the index.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request did not complete in time.
    #[error("index request timed out")]
    Timeout,

    /// Written records did not become visible within the wait bound.
    #[error("index not ready after {waited_ms}ms: expected {expected} records, saw {observed}")]
    NotReady {
        expected: u64,
        observed: u64,
        waited_ms: u128,
    },

    /// Similarity computation failed.
    #[error("similarity error: {0}")]
    Similarity(#[from] EmbeddingError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl IndexError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Similarity(err) => err.kind(),
            Self::IndexNotFound(_)
            | Self::Api { .. }
            | Self::InvalidResponse(_)
            | Self::Timeout
            | Self::NotReady { .. }
            | Self::Serialization(_)
            | Self::Http(_) => ErrorKind::Provider,
        }
    }
}
