//! Records, queries and index descriptors.

use std::time::Duration;

use mentormatch_embeddings::Embedding;
use serde::{Deserialize, Serialize};

use crate::Metadata;
use crate::filter::MetadataFilter;

/// Distance metric an index is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Dotproduct,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        };
        f.write_str(name)
    }
}

/// Name and schema of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl IndexSpec {
    /// A cosine index with the given name and dimension.
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
        }
    }
}

/// A stored vector with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Embedding,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, values: Embedding) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A nearest-neighbour query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Query vector.
    pub vector: Embedding,

    /// Maximum number of matches; must be positive.
    pub top_k: usize,

    /// Optional metadata restriction.
    pub filter: Option<MetadataFilter>,

    /// Namespace; `None` uses the client default.
    pub namespace: Option<String>,

    /// Return stored vectors with each match.
    pub include_values: bool,

    /// Return metadata with each match.
    pub include_metadata: bool,
}

impl QueryRequest {
    /// Query returning metadata but not vectors.
    pub fn new(vector: Embedding, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            filter: None,
            namespace: None,
            include_values: false,
            include_metadata: true,
        }
    }

    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_values(mut self) -> Self {
        self.include_values = true;
        self
    }
}

/// A single query result.
///
/// Fields are optional because a remote index is not trusted to fill them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: Option<f64>,
    pub values: Option<Embedding>,
    pub metadata: Option<Metadata>,
}

impl QueryMatch {
    /// String metadata field, if present.
    pub fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(field))
            .and_then(serde_json::Value::as_str)
    }
}

/// Record counts reported by an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: usize,
    pub total_records: u64,
    pub namespace_records: u64,
}

/// Bounds for waiting on freshly written records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}
