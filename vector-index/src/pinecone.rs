//! Pinecone REST client.
//!
//! Control plane calls (list, describe, create) go to `control_url`; record
//! operations go to the index host, which is either configured or resolved
//! once per client from the control plane.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::Metadata;
use crate::error::{IndexError, Result};
use crate::index::{VectorIndex, validate_query, validate_records, verify_existing};
use crate::record::{IndexSpec, IndexStats, Metric, QueryMatch, QueryRequest, VectorRecord};

/// Default control plane URL.
pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";

/// API version header value sent with every request.
pub const API_VERSION: &str = "2024-10";

/// Records per upsert request.
const UPSERT_BATCH: usize = 100;

/// Settings for [`PineconeIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// API key; required.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Control plane base URL.
    pub control_url: String,

    /// Data plane host; resolved from the control plane when absent.
    pub host: Option<String>,

    /// Index schema.
    pub index: IndexSpec,

    /// Namespace used when callers pass none.
    pub namespace: String,

    /// Serverless cloud for index creation.
    pub cloud: String,

    /// Serverless region for index creation.
    pub region: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            control_url: DEFAULT_CONTROL_URL.to_string(),
            host: None,
            index: IndexSpec::cosine("responses", mentormatch_embeddings::DEFAULT_DIMENSION),
            namespace: String::new(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Vector index backed by Pinecone.
pub struct PineconeIndex {
    config: PineconeConfig,
    api_key: String,
    client: reqwest::Client,
    host: OnceCell<String>,
}

impl PineconeIndex {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: PineconeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                IndexError::Configuration("PINECONE_API_KEY is not set".to_string())
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let host = OnceCell::new_with(config.host.as_deref().map(normalize_host));

        Ok(Self {
            config,
            api_key,
            client,
            host,
        })
    }

    fn namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.unwrap_or(&self.config.namespace)
    }

    fn control(&self, path: &str) -> String {
        format!("{}{path}", self.config.control_url.trim_end_matches('/'))
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self.describe().await?;
                let host = normalize_host(&description.host);
                debug!("Resolved host for index {}: {host}", self.config.index.name);
                Ok::<_, IndexError>(host)
            })
            .await?;
        Ok(host.as_str())
    }

    async fn data(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let host = self.host().await?;
        Ok(self.request(method, format!("{host}{path}")))
    }

    async fn describe(&self) -> Result<IndexDescription> {
        let name = &self.config.index.name;
        let response = self
            .request(reqwest::Method::GET, self.control(&format!("/indexes/{name}")))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IndexError::IndexNotFound(name.clone()));
        }
        parse_json(response).await
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let response = self
            .request(reqwest::Method::GET, self.control("/indexes"))
            .send()
            .await?;
        let list: IndexList = parse_json(response).await?;
        Ok(list.indexes)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.config.index.name
    }

    fn dimension(&self) -> usize {
        self.config.index.dimension
    }

    async fn ensure_index_exists(&self, spec: &IndexSpec) -> Result<bool> {
        info!("Checking for index {}", spec.name);

        let indexes = self.list_indexes().await?;
        if let Some(existing) = indexes.iter().find(|i| i.name == spec.name) {
            verify_existing(&existing.spec(), spec)?;
            info!("Index {} already exists", spec.name);
            return Ok(false);
        }

        let body = serde_json::json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric,
            "spec": {
                "serverless": { "cloud": self.config.cloud, "region": self.config.region }
            }
        });

        let response = self
            .request(reqwest::Method::POST, self.control("/indexes"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            // Created concurrently by someone else.
            info!("Index {} already exists", spec.name);
            return Ok(false);
        }
        let _: serde_json::Value = parse_json(response).await?;

        info!("Created index {}; it may take a moment to be ready", spec.name);
        Ok(true)
    }

    async fn upsert(&self, records: Vec<VectorRecord>, namespace: Option<&str>) -> Result<usize> {
        validate_records(self.dimension(), &records)?;
        let namespace = self.namespace(namespace);

        let mut written = 0;
        for batch in records.chunks(UPSERT_BATCH) {
            let body = serde_json::json!({ "vectors": batch, "namespace": namespace });
            let response = self
                .data(reqwest::Method::POST, "/vectors/upsert")
                .await?
                .json(&body)
                .send()
                .await?;
            let result: UpsertResponse = parse_json(response).await?;
            written += result.upserted_count;
        }

        debug!("Upserted {written} records into {}", self.name());
        Ok(written)
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<QueryMatch>> {
        validate_query(self.dimension(), &request)?;

        let mut body = serde_json::json!({
            "vector": request.vector,
            "topK": request.top_k,
            "namespace": self.namespace(request.namespace.as_deref()),
            "includeValues": request.include_values,
            "includeMetadata": request.include_metadata,
        });
        if let Some(filter) = &request.filter {
            debug!("Applying filter: {}", filter.to_pinecone());
            body["filter"] = filter.to_pinecone();
        }

        let response = self
            .data(reqwest::Method::POST, "/query")
            .await?
            .json(&body)
            .send()
            .await?;
        let result: QueryResponse = parse_json(response).await?;

        Ok(result
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                id: m.id,
                score: m.score,
                values: m.values.filter(|v| !v.is_empty()),
                metadata: m.metadata,
            })
            .collect())
    }

    async fn fetch_vectors(
        &self,
        ids: &[String],
        namespace: Option<&str>,
    ) -> Result<HashMap<String, VectorRecord>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut params: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        params.push(("namespace", self.namespace(namespace)));

        let response = self
            .data(reqwest::Method::GET, "/vectors/fetch")
            .await?
            .query(&params)
            .send()
            .await?;
        let result: FetchResponse = parse_json(response).await?;

        Ok(result
            .vectors
            .into_iter()
            .map(|(id, v)| {
                let record = VectorRecord {
                    id: v.id,
                    values: v.values,
                    metadata: v.metadata.unwrap_or_default(),
                };
                (id, record)
            })
            .collect())
    }

    async fn clear(&self, namespace: Option<&str>) -> Result<()> {
        let namespace = self.namespace(namespace);
        info!("Clearing namespace {namespace:?} of index {}", self.name());

        let builder = match self.data(reqwest::Method::POST, "/vectors/delete").await {
            Ok(builder) => builder,
            Err(IndexError::IndexNotFound(name)) => {
                warn!("Index {name} not found, nothing to clear");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let response = builder
            .json(&serde_json::json!({ "deleteAll": true, "namespace": namespace }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("Index {} or namespace {namespace:?} not found, nothing to clear", self.name());
            return Ok(());
        }
        let _: serde_json::Value = parse_json(response).await?;

        info!("Cleared namespace {namespace:?} of index {}", self.name());
        Ok(())
    }

    async fn stats(&self, namespace: Option<&str>) -> Result<IndexStats> {
        let response = self
            .data(reqwest::Method::POST, "/describe_index_stats")
            .await?
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let result: StatsResponse = parse_json(response).await?;

        let namespace_records = result
            .namespaces
            .get(self.namespace(namespace))
            .map_or(0, |ns| ns.vector_count);

        Ok(IndexStats {
            dimension: result.dimension,
            total_records: result.total_vector_count,
            namespace_records,
        })
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(IndexError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexError::InvalidResponse(format!("malformed body: {e}")))
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    dimension: usize,
    metric: Metric,
    #[serde(default)]
    host: String,
}

impl IndexDescription {
    fn spec(&self) -> IndexSpec {
        IndexSpec {
            name: self.name.clone(),
            dimension: self.dimension,
            metric: self.metric,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    score: Option<f64>,
    values: Option<Vec<f32>>,
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, WireRecord>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    #[serde(default)]
    values: Vec<f32>,
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}
