//! # Embeddings
//!
//! Embedding generation and vector similarity for MentorMatch.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert profile text to dense vectors
//! - **Dimension Checks**: Every vector is validated against the agreed dimension
//! - **Similarity**: Cosine similarity and top-k ranking
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Embeddings                          │
//! ├──────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► cosine_similarity│
//! │       │                                   │          │
//! │       ▼                                   ▼          │
//! │    OpenAI                             find_top_k     │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, ErrorKind, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider, ProviderConfig,
    embed_checked,
};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
