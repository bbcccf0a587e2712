//! Error types for the matching engine.

use mentormatch_embeddings::{EmbeddingError, ErrorKind};
use mentormatch_vector_index::IndexError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors that can occur while storing profiles or matching.
#[derive(Error, Debug)]
pub enum MatchError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Profile input rejected before any network call.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A stored record was expected but is missing.
    #[error("no stored vector for {0}")]
    NotFound(String),
}

impl MatchError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Embedding(err) => err.kind(),
            Self::Index(err) => err.kind(),
            Self::InvalidProfile(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
