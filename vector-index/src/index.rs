//! The vector index contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::record::{IndexSpec, IndexStats, QueryMatch, QueryRequest, ReadyPolicy, VectorRecord};

/// A store of vectors answering filtered nearest-neighbour queries.
///
/// Implementations are explicitly constructed and shared by reference; the
/// engine is generic over this trait so tests can swap in
/// [`InMemoryIndex`](crate::InMemoryIndex).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the backing index.
    fn name(&self) -> &str;

    /// Dimension every stored and queried vector must have.
    fn dimension(&self) -> usize;

    /// Create the index if it is absent.
    ///
    /// Returns `true` when a new index was created. An existing index with a
    /// different dimension or metric is a configuration error.
    async fn ensure_index_exists(&self, spec: &IndexSpec) -> Result<bool>;

    /// Insert or overwrite records. Returns the number written.
    async fn upsert(&self, records: Vec<VectorRecord>, namespace: Option<&str>) -> Result<usize>;

    /// Up to `top_k` matches by descending similarity.
    async fn query(&self, request: QueryRequest) -> Result<Vec<QueryMatch>>;

    /// Stored records for `ids`; absent ids are omitted.
    async fn fetch_vectors(
        &self,
        ids: &[String],
        namespace: Option<&str>,
    ) -> Result<HashMap<String, VectorRecord>>;

    /// Delete every record in the namespace. A missing index is not an error.
    async fn clear(&self, namespace: Option<&str>) -> Result<()>;

    /// Record counts.
    async fn stats(&self, namespace: Option<&str>) -> Result<IndexStats>;

    /// Poll [`stats`](Self::stats) until the namespace holds exactly
    /// `expected` records.
    ///
    /// A count above `expected` is not ready: deletes become visible after a
    /// delay, so a count left over from before a `clear` must drain first.
    async fn wait_for_records(
        &self,
        expected: u64,
        policy: ReadyPolicy,
        namespace: Option<&str>,
    ) -> Result<IndexStats> {
        let started = Instant::now();
        loop {
            let stats = self.stats(namespace).await?;
            if stats.namespace_records == expected {
                debug!(
                    "Index {} ready with {} records after {}ms",
                    self.name(),
                    stats.namespace_records,
                    started.elapsed().as_millis()
                );
                return Ok(stats);
            }

            if started.elapsed() >= policy.timeout {
                return Err(IndexError::NotReady {
                    expected,
                    observed: stats.namespace_records,
                    waited_ms: started.elapsed().as_millis(),
                });
            }

            tokio::time::sleep(policy.poll_interval).await;
        }
    }
}

/// Check every record against `dimension` before anything is written.
pub(crate) fn validate_records(dimension: usize, records: &[VectorRecord]) -> Result<()> {
    for record in records {
        if record.id.trim().is_empty() {
            return Err(IndexError::Validation("record id is empty".to_string()));
        }
        if record.values.len() != dimension {
            return Err(IndexError::DimensionMismatch {
                id: record.id.clone(),
                expected: dimension,
                actual: record.values.len(),
            });
        }
    }
    Ok(())
}

/// Check a query before it is executed or sent.
pub(crate) fn validate_query(dimension: usize, request: &QueryRequest) -> Result<()> {
    if request.top_k == 0 {
        return Err(IndexError::Validation(
            "top_k must be a positive integer".to_string(),
        ));
    }
    if request.vector.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            id: "<query>".to_string(),
            expected: dimension,
            actual: request.vector.len(),
        });
    }
    if let Some(filter) = &request.filter {
        filter.validate()?;
    }
    Ok(())
}

/// Check a requested spec against the one an index already has.
pub(crate) fn verify_existing(existing: &IndexSpec, requested: &IndexSpec) -> Result<()> {
    if existing.dimension != requested.dimension || existing.metric != requested.metric {
        return Err(IndexError::Configuration(format!(
            "index `{}` exists with dimension {} / {} but {} / {} was requested",
            existing.name,
            existing.dimension,
            existing.metric,
            requested.dimension,
            requested.metric
        )));
    }
    Ok(())
}
