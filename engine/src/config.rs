//! Configuration for profile storage and matching.

use serde::{Deserialize, Serialize};

/// How the assignment loop decides a mentor is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeKey {
    /// Stable record id.
    #[default]
    Id,
    /// Display name; mentors sharing a name count as one.
    Name,
}

/// Configuration for the matching engine and profile store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Candidates requested per mentee.
    pub top_k: usize,

    /// Mentee queries in flight at once during retrieval.
    pub retrieval_concurrency: usize,

    /// Key of the taken-mentor set.
    pub dedupe_key: DedupeKey,

    /// Characters of source text kept in metadata.
    pub source_text_limit: usize,

    /// Expected embedding dimension.
    pub dimension: usize,

    /// Namespace for stores and queries; `None` uses the index default.
    pub namespace: Option<String>,

    /// Records considered when building connections.
    pub connections_top_k: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            retrieval_concurrency: 1,
            dedupe_key: DedupeKey::Id,
            source_text_limit: 1000,
            dimension: mentormatch_embeddings::DEFAULT_DIMENSION,
            namespace: None,
            connections_top_k: 100,
        }
    }
}

impl MatchingConfig {
    /// Set the expected embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the number of candidates per mentee.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the retrieval concurrency.
    pub fn with_retrieval_concurrency(mut self, concurrency: usize) -> Self {
        self.retrieval_concurrency = concurrency;
        self
    }
}
