//! In-process vector index.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mentormatch_embeddings::find_top_k;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{IndexError, Result};
use crate::index::{VectorIndex, validate_query, validate_records, verify_existing};
use crate::record::{IndexSpec, IndexStats, Metric, QueryMatch, QueryRequest, VectorRecord};

#[derive(Default)]
struct State {
    spec: Option<IndexSpec>,
    namespaces: HashMap<String, BTreeMap<String, VectorRecord>>,
}

/// A similarity index held in memory.
///
/// Scores with cosine similarity only. Records within a namespace are kept
/// ordered by id, so equal scores come back in id order.
pub struct InMemoryIndex {
    name: String,
    dimension: usize,
    default_namespace: String,
    state: RwLock<State>,
}

impl InMemoryIndex {
    /// Create an index that does not exist yet; records can still be
    /// written before [`ensure_index_exists`](VectorIndex::ensure_index_exists).
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            default_namespace: String::new(),
            state: RwLock::new(State::default()),
        }
    }

    /// Use `namespace` when callers pass none.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    fn namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.unwrap_or(&self.default_namespace)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn ensure_index_exists(&self, spec: &IndexSpec) -> Result<bool> {
        if spec.metric != Metric::Cosine {
            return Err(IndexError::Configuration(format!(
                "in-memory index only supports cosine, got {}",
                spec.metric
            )));
        }
        if spec.dimension != self.dimension {
            return Err(IndexError::Configuration(format!(
                "in-memory index `{}` holds {}-dimensional vectors, {} requested",
                self.name, self.dimension, spec.dimension
            )));
        }

        let mut state = self.state.write().await;
        match &state.spec {
            Some(existing) => {
                verify_existing(existing, spec)?;
                debug!("Index {} already exists", spec.name);
                Ok(false)
            }
            None => {
                state.spec = Some(spec.clone());
                info!("Created in-memory index {}", spec.name);
                Ok(true)
            }
        }
    }

    async fn upsert(&self, records: Vec<VectorRecord>, namespace: Option<&str>) -> Result<usize> {
        validate_records(self.dimension, &records)?;

        let namespace = self.namespace(namespace).to_string();
        let count = records.len();

        let mut state = self.state.write().await;
        let entries = state.namespaces.entry(namespace).or_default();
        for record in records {
            debug!("Upserted {} into index {}", record.id, self.name);
            entries.insert(record.id.clone(), record);
        }

        Ok(count)
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<QueryMatch>> {
        validate_query(self.dimension, &request)?;

        let state = self.state.read().await;
        let Some(entries) = state
            .namespaces
            .get(self.namespace(request.namespace.as_deref()))
        else {
            return Ok(Vec::new());
        };

        let candidates = entries
            .values()
            .filter(|r| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|f| f.matches(&r.metadata))
            })
            .map(|r| (r.id.as_str(), r.values.as_slice()));

        let ranked = find_top_k(&request.vector, candidates, request.top_k)?;

        Ok(ranked
            .into_iter()
            .filter_map(|hit| {
                let record = entries.get(&hit.id)?;
                Some(QueryMatch {
                    id: hit.id,
                    score: Some(hit.score),
                    values: request.include_values.then(|| record.values.clone()),
                    metadata: request.include_metadata.then(|| record.metadata.clone()),
                })
            })
            .collect())
    }

    async fn fetch_vectors(
        &self,
        ids: &[String],
        namespace: Option<&str>,
    ) -> Result<HashMap<String, VectorRecord>> {
        let state = self.state.read().await;
        let Some(entries) = state.namespaces.get(self.namespace(namespace)) else {
            return Ok(HashMap::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| entries.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    async fn clear(&self, namespace: Option<&str>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.spec.is_none() && state.namespaces.is_empty() {
            warn!("Index {} not found, nothing to clear", self.name);
            return Ok(());
        }

        let namespace = self.namespace(namespace);
        state.namespaces.remove(namespace);
        info!("Cleared namespace {namespace:?} of index {}", self.name);
        Ok(())
    }

    async fn stats(&self, namespace: Option<&str>) -> Result<IndexStats> {
        let state = self.state.read().await;
        let total_records = state.namespaces.values().map(|ns| ns.len() as u64).sum();
        let namespace_records = state
            .namespaces
            .get(self.namespace(namespace))
            .map_or(0, |ns| ns.len() as u64);

        Ok(IndexStats {
            dimension: self.dimension,
            total_records,
            namespace_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetadataFilter;
    use crate::record::ReadyPolicy;
    use mentormatch_embeddings::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn record(id: &str, values: Vec<f32>, kind: &str) -> VectorRecord {
        let mut metadata = crate::Metadata::new();
        metadata.insert("type".to_string(), kind.into());
        metadata.insert("name".to_string(), id.into());
        VectorRecord::new(id, values).with_metadata(metadata)
    }

    #[tokio::test]
    async fn test_ensure_index_exists_is_idempotent() {
        let index = InMemoryIndex::new("responses", 3);
        let spec = IndexSpec::cosine("responses", 3);

        assert!(index.ensure_index_exists(&spec).await.unwrap());
        assert!(!index.ensure_index_exists(&spec).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_index_rejects_schema_mismatch() {
        let index = InMemoryIndex::new("responses", 3);
        let err = index
            .ensure_index_exists(&IndexSpec::cosine("responses", 4))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_query_ranks_and_filters() {
        let index = InMemoryIndex::new("responses", 3);
        index
            .upsert(
                vec![
                    record("a", vec![1.0, 0.0, 0.0], "mentor"),
                    record("b", vec![0.0, 1.0, 0.0], "mentor"),
                    record("c", vec![0.7, 0.7, 0.0], "mentor"),
                    record("d", vec![1.0, 0.0, 0.0], "mentee"),
                ],
                None,
            )
            .await
            .unwrap();

        let matches = index
            .query(
                QueryRequest::new(vec![1.0, 0.0, 0.0], 2)
                    .with_filter(MetadataFilter::eq("type", "mentor")),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(matches[0].values.is_none());
        assert_eq!(matches[0].metadata_str("type"), Some("mentor"));
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected() {
        let index = InMemoryIndex::new("responses", 2);
        let err = index
            .query(QueryRequest::new(vec![1.0, 0.0], 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension_without_writing() {
        let index = InMemoryIndex::new("responses", 3);
        let err = index
            .upsert(
                vec![
                    record("ok", vec![1.0, 0.0, 0.0], "mentor"),
                    record("bad", vec![1.0, 0.0], "mentor"),
                ],
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        assert_eq!(index.stats(None).await.unwrap().namespace_records, 0);
    }

    #[tokio::test]
    async fn test_fetch_omits_missing_ids() {
        let index = InMemoryIndex::new("responses", 2);
        index
            .upsert(vec![record("a", vec![0.25, 0.5], "mentor")], None)
            .await
            .unwrap();

        let fetched = index
            .fetch_vectors(&["a".to_string(), "ghost".to_string()], None)
            .await
            .unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched["a"].values, vec![0.25, 0.5]);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let index = InMemoryIndex::new("responses", 2);
        index
            .upsert(vec![record("a", vec![1.0, 0.0], "mentor")], Some("ns1"))
            .await
            .unwrap();

        let default_hits = index
            .query(QueryRequest::new(vec![1.0, 0.0], 5))
            .await
            .unwrap();
        assert!(default_hits.is_empty());

        let ns_hits = index
            .query(QueryRequest::new(vec![1.0, 0.0], 5).with_namespace("ns1"))
            .await
            .unwrap();
        assert_eq!(ns_hits.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_missing_index_is_noop() {
        let index = InMemoryIndex::new("never-created", 2);
        index.clear(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_removes_namespace() {
        let index = InMemoryIndex::new("responses", 2);
        index
            .upsert(vec![record("a", vec![1.0, 0.0], "mentor")], None)
            .await
            .unwrap();
        index.clear(None).await.unwrap();
        assert_eq!(index.stats(None).await.unwrap().total_records, 0);
    }

    #[tokio::test]
    async fn test_wait_for_records() {
        let index = InMemoryIndex::new("responses", 2);
        index
            .upsert(vec![record("a", vec![1.0, 0.0], "mentor")], None)
            .await
            .unwrap();

        let policy = ReadyPolicy {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
        };

        let stats = index.wait_for_records(1, policy, None).await.unwrap();
        assert_eq!(stats.namespace_records, 1);

        let err = index.wait_for_records(2, policy, None).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::NotReady {
                expected: 2,
                observed: 1,
                ..
            }
        ));
    }
}
