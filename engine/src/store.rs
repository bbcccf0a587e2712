//! Embedding and storage of profiles.

use std::sync::Arc;

use mentormatch_embeddings::{EmbeddingProvider, cosine_similarity, embed_checked};
use mentormatch_vector_index::{
    IndexSpec, MetadataFilter, QueryMatch, QueryRequest, VectorIndex,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::connections::{Connection, build_connections};
use crate::error::{MatchError, Result};
use crate::profile::{ProfileInput, ProfileRecord};

/// What happened to a submitted profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StoreOutcome {
    Stored { id: String },
    /// The profile had no text to embed.
    Skipped { name: String },
}

/// Writes profiles into a vector index and answers lookups over them.
pub struct ProfileStore<E: ?Sized, V: ?Sized> {
    embedder: Arc<E>,
    index: Arc<V>,
    config: MatchingConfig,
    spec: IndexSpec,
}

impl<E, V> ProfileStore<E, V>
where
    E: EmbeddingProvider + ?Sized,
    V: VectorIndex + ?Sized,
{
    /// A store over `index`, creating a cosine index of the configured
    /// dimension when asked to.
    pub fn new(embedder: Arc<E>, index: Arc<V>, config: MatchingConfig) -> Self {
        let spec = IndexSpec::cosine(index.name(), config.dimension);
        Self {
            embedder,
            index,
            config,
            spec,
        }
    }

    /// Use a different spec for [`ensure_index`](Self::ensure_index).
    pub fn with_index_spec(mut self, spec: IndexSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn index(&self) -> &Arc<V> {
        &self.index
    }

    fn namespace(&self) -> Option<&str> {
        self.config.namespace.as_deref()
    }

    /// Create the index if it is absent. Returns `true` when created.
    pub async fn ensure_index(&self) -> Result<bool> {
        Ok(self.index.ensure_index_exists(&self.spec).await?)
    }

    /// Embed and upsert one profile.
    ///
    /// A profile with no text is skipped without touching the provider or
    /// the index.
    pub async fn store_profile(&self, profile: &ProfileInput) -> Result<StoreOutcome> {
        profile.validate()?;

        let text = profile.source_text();
        if text.trim().is_empty() {
            warn!(
                "Skipping {} {}: no text to embed",
                profile.role, profile.name
            );
            return Ok(StoreOutcome::Skipped {
                name: profile.name.clone(),
            });
        }

        let vector = embed_checked(self.embedder.as_ref(), &text, self.config.dimension).await?;
        let record = ProfileRecord::new(profile, vector, &text, self.config.source_text_limit);
        let id = record.id.clone();

        self.index
            .upsert(vec![record.into_vector_record()], self.namespace())
            .await?;

        info!("Stored {} {} as {}", profile.role, profile.name, id);
        Ok(StoreOutcome::Stored { id })
    }

    /// Store profiles one by one, stopping at the first failure.
    pub async fn store_all(&self, profiles: &[ProfileInput]) -> Result<Vec<StoreOutcome>> {
        let mut outcomes = Vec::with_capacity(profiles.len());
        for profile in profiles {
            outcomes.push(self.store_profile(profile).await?);
        }
        Ok(outcomes)
    }

    /// Records nearest to `text`.
    pub async fn find_similar(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        if text.trim().is_empty() {
            warn!("Empty query text, returning no matches");
            return Ok(Vec::new());
        }

        let vector = embed_checked(self.embedder.as_ref(), text, self.config.dimension).await?;
        let mut request = QueryRequest::new(vector, top_k);
        request.filter = filter;
        request.namespace = self.config.namespace.clone();

        let matches = self.index.query(request).await?;
        debug!("Found {} similar records", matches.len());
        Ok(matches)
    }

    /// Cosine similarity of two stored records.
    pub async fn similarity_between(&self, id1: &str, id2: &str) -> Result<f64> {
        let ids = [id1.to_string(), id2.to_string()];
        let records = self.index.fetch_vectors(&ids, self.namespace()).await?;

        let lookup = |id: &str| {
            records
                .get(id)
                .map(|r| r.values.as_slice())
                .ok_or_else(|| MatchError::NotFound(id.to_string()))
        };

        let score = cosine_similarity(lookup(id1)?, lookup(id2)?)?;
        debug!("Similarity between {id1} and {id2}: {score:.4}");
        Ok(score)
    }

    /// Pairwise connections between records matching `filter`.
    ///
    /// Records are gathered with a constant query vector, so at most
    /// `connections_top_k` of them take part.
    pub async fn connections(
        &self,
        filter: MetadataFilter,
        namespace: Option<&str>,
    ) -> Result<Vec<Connection>> {
        let namespace = namespace.or(self.namespace());
        let mut request = QueryRequest::new(
            vec![1.0; self.config.dimension],
            self.config.connections_top_k,
        )
        .with_filter(filter)
        .with_values();
        request.namespace = namespace.map(str::to_string);

        let records = self.index.query(request).await?;
        let connections = build_connections(&records)?;
        info!(
            "Built {} connections from {} records",
            connections.len(),
            records.len()
        );
        Ok(connections)
    }

    /// Delete every record in the configured namespace.
    pub async fn reset(&self) -> Result<()> {
        self.index.clear(self.namespace()).await?;
        Ok(())
    }
}
