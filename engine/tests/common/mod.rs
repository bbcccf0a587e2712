//! Test doubles shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mentormatch_embeddings::{
    Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use mentormatch_vector_index::{
    IndexSpec, IndexStats, QueryMatch, QueryRequest, VectorIndex, VectorRecord,
};

/// Embeds text by keyword: the first rule whose keyword occurs in the text
/// wins, otherwise the fallback vector is returned.
pub struct ScriptedEmbedder {
    rules: Vec<(String, Embedding)>,
    fallback: Embedding,
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(fallback: Embedding) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn on(mut self, keyword: &str, vector: Embedding) -> Self {
        self.rules.push((keyword.to_string(), vector));
        self
    }

    /// Answer texts containing `keyword` with an HTTP 500.
    pub fn failing_on(mut self, keyword: &str) -> Self {
        self.fail_on = Some(keyword.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    fn default_dimension(&self) -> usize {
        self.fallback.len()
    }

    async fn embed(&self, request: EmbeddingRequest) -> mentormatch_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_on
            .as_deref()
            .is_some_and(|keyword| request.text.contains(keyword))
        {
            return Err(EmbeddingError::ApiRequest {
                status: 500,
                message: "upstream unavailable".to_string(),
            });
        }

        let embedding = self
            .rules
            .iter()
            .find(|(keyword, _)| request.text.contains(keyword.as_str()))
            .map_or_else(|| self.fallback.clone(), |(_, v)| v.clone());

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "scripted".to_string(),
            tokens_used: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Answers queries from a queue of canned responses and records each
/// request.
pub struct ScriptedIndex {
    dimension: usize,
    routes: Vec<(Embedding, Vec<QueryMatch>)>,
    responses: Mutex<VecDeque<Vec<QueryMatch>>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl ScriptedIndex {
    pub fn new(dimension: usize, responses: Vec<Vec<QueryMatch>>) -> Self {
        Self {
            dimension,
            routes: Vec::new(),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer queries for `vector` with `matches` regardless of call order.
    pub fn route(mut self, vector: Embedding, matches: Vec<QueryMatch>) -> Self {
        self.routes.push((vector, matches));
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    fn name(&self) -> &str {
        "scripted"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn ensure_index_exists(&self, _spec: &IndexSpec) -> mentormatch_vector_index::Result<bool> {
        Ok(false)
    }

    async fn upsert(
        &self,
        records: Vec<VectorRecord>,
        _namespace: Option<&str>,
    ) -> mentormatch_vector_index::Result<usize> {
        Ok(records.len())
    }

    async fn query(&self, request: QueryRequest) -> mentormatch_vector_index::Result<Vec<QueryMatch>> {
        let routed = self
            .routes
            .iter()
            .find(|(vector, _)| *vector == request.vector)
            .map(|(_, matches)| matches.clone());
        self.requests.lock().unwrap().push(request);

        // Let other in-flight queries run before this one answers.
        tokio::task::yield_now().await;

        match routed {
            Some(matches) => Ok(matches),
            None => Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default()),
        }
    }

    async fn fetch_vectors(
        &self,
        _ids: &[String],
        _namespace: Option<&str>,
    ) -> mentormatch_vector_index::Result<HashMap<String, VectorRecord>> {
        Ok(HashMap::new())
    }

    async fn clear(&self, _namespace: Option<&str>) -> mentormatch_vector_index::Result<()> {
        Ok(())
    }

    async fn stats(&self, _namespace: Option<&str>) -> mentormatch_vector_index::Result<IndexStats> {
        Ok(IndexStats {
            dimension: self.dimension,
            total_records: 0,
            namespace_records: 0,
        })
    }
}

/// A mentor match as a remote index would return it.
pub fn mentor_match(id: &str, name: &str, score: f64) -> QueryMatch {
    QueryMatch {
        id: id.to_string(),
        score: Some(score),
        values: None,
        metadata: serde_json::json!({ "type": "mentor", "name": name })
            .as_object()
            .cloned(),
    }
}
