//! # Vector Index
//!
//! Storage and filtered nearest-neighbour retrieval of profile embeddings.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    VectorIndex (trait)                   │
//! │  ensure_index_exists · upsert · query · fetch · clear    │
//! ├───────────────────────────┬──────────────────────────────┤
//! │      InMemoryIndex        │        PineconeIndex         │
//! │  (tests, offline runs)    │   (REST control + data plane)│
//! └───────────────────────────┴──────────────────────────────┘
//! ```
//!
//! Queries may carry a [`MetadataFilter`] restricting results to records
//! whose metadata satisfies equality or set predicates.

pub mod error;
pub mod filter;
pub mod index;
pub mod memory;
pub mod pinecone;
pub mod record;

pub use error::{IndexError, Result};
pub use filter::MetadataFilter;
pub use index::VectorIndex;
pub use memory::InMemoryIndex;
pub use pinecone::{PineconeConfig, PineconeIndex};
pub use record::{
    IndexSpec, IndexStats, Metric, QueryMatch, QueryRequest, ReadyPolicy, VectorRecord,
};

/// Free-form metadata stored alongside a vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
