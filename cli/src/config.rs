//! Configuration file and environment handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mentormatch_embeddings::ProviderConfig;
use mentormatch_engine::{DedupeKey, MatchingConfig};
use mentormatch_vector_index::{IndexSpec, Metric, PineconeConfig, ReadyPolicy};
use serde::{Deserialize, Serialize};

/// File read when no `--config` is given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "mentormatch.toml";

/// Top level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentorMatchConfig {
    pub embedding: EmbeddingSection,
    pub index: IndexSection,
    pub matching: MatchingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    /// Only read from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        let provider = ProviderConfig::default();
        Self {
            api_key: None,
            model: provider.model,
            base_url: provider.base_url,
            dimension: mentormatch_embeddings::DEFAULT_DIMENSION,
            timeout_secs: provider.timeout_secs,
        }
    }
}

/// Where vectors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process memory; gone when the command exits.
    Memory,
    #[default]
    Pinecone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub backend: Backend,
    /// Only read from `PINECONE_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub name: String,
    pub metric: Metric,
    pub namespace: Option<String>,
    pub control_url: String,
    pub host: Option<String>,
    pub cloud: String,
    pub region: String,
    pub timeout_secs: u64,
    pub ready_timeout_secs: u64,
    pub ready_poll_millis: u64,
}

impl Default for IndexSection {
    fn default() -> Self {
        let pinecone = PineconeConfig::default();
        let ready = ReadyPolicy::default();
        Self {
            backend: Backend::default(),
            api_key: None,
            name: pinecone.index.name,
            metric: pinecone.index.metric,
            namespace: None,
            control_url: pinecone.control_url,
            host: None,
            cloud: pinecone.cloud,
            region: pinecone.region,
            timeout_secs: pinecone.timeout_secs,
            ready_timeout_secs: ready.timeout.as_secs(),
            ready_poll_millis: ready.poll_interval.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    pub top_k: usize,
    pub retrieval_concurrency: usize,
    pub dedupe_key: DedupeKey,
    pub source_text_limit: usize,
}

impl Default for MatchingSection {
    fn default() -> Self {
        let matching = MatchingConfig::default();
        Self {
            top_k: matching.top_k,
            retrieval_concurrency: matching.retrieval_concurrency,
            dedupe_key: matching.dedupe_key,
            source_text_limit: matching.source_text_limit,
        }
    }
}

/// Load `.env.local` and then `.env` from `dir`; variables already set win.
///
/// Returns the files that were loaded.
pub fn load_dotenv(dir: &Path) -> Vec<PathBuf> {
    [".env.local", ".env"]
        .into_iter()
        .map(|name| dir.join(name))
        .filter(|path| dotenvy::from_path(path).is_ok())
        .collect()
}

impl MentorMatchConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when it exists, then
    /// apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(key) = var("PINECONE_API_KEY") {
            self.index.api_key = Some(key);
        }
        if let Some(host) = var("PINECONE_INDEX_HOST") {
            self.index.host = Some(host);
        }
        if let Some(name) = var("MENTORMATCH_INDEX") {
            self.index.name = name;
        }
        if let Some(namespace) = var("MENTORMATCH_NAMESPACE") {
            self.index.namespace = Some(namespace);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be greater than 0");
        }
        if self.index.name.trim().is_empty() {
            bail!("index.name must not be empty");
        }
        if self.matching.top_k == 0 {
            bail!("matching.top_k must be greater than 0");
        }
        if self.matching.retrieval_concurrency == 0 {
            bail!("matching.retrieval_concurrency must be greater than 0");
        }
        if self.index.ready_poll_millis == 0 {
            bail!("index.ready_poll_millis must be greater than 0");
        }
        Ok(())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.embedding.api_key.clone(),
            base_url: self.embedding.base_url.clone(),
            model: self.embedding.model.clone(),
            timeout_secs: self.embedding.timeout_secs,
        }
    }

    pub fn index_spec(&self) -> IndexSpec {
        IndexSpec {
            name: self.index.name.clone(),
            dimension: self.embedding.dimension,
            metric: self.index.metric,
        }
    }

    pub fn pinecone_config(&self) -> PineconeConfig {
        PineconeConfig {
            api_key: self.index.api_key.clone(),
            control_url: self.index.control_url.clone(),
            host: self.index.host.clone(),
            index: self.index_spec(),
            namespace: self.index.namespace.clone().unwrap_or_default(),
            cloud: self.index.cloud.clone(),
            region: self.index.region.clone(),
            timeout_secs: self.index.timeout_secs,
        }
    }

    pub fn matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            top_k: self.matching.top_k,
            retrieval_concurrency: self.matching.retrieval_concurrency,
            dedupe_key: self.matching.dedupe_key,
            source_text_limit: self.matching.source_text_limit,
            dimension: self.embedding.dimension,
            namespace: self.index.namespace.clone(),
            ..MatchingConfig::default()
        }
    }

    pub fn ready_policy(&self) -> ReadyPolicy {
        ReadyPolicy {
            timeout: Duration::from_secs(self.index.ready_timeout_secs),
            poll_interval: Duration::from_millis(self.index.ready_poll_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MentorMatchConfig::default();

        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.index.backend, Backend::Pinecone);
        assert_eq!(config.index.name, "responses");
        assert_eq!(config.index.metric, Metric::Cosine);
        assert_eq!(config.matching.top_k, 10);
        assert_eq!(config.matching.dedupe_key, DedupeKey::Id);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[index]
backend = "memory"
name = "cohort-2024"
namespace = "ns1"
ready_timeout_secs = 5

[matching]
top_k = 3
dedupe_key = "name"
"#
        )
        .unwrap();

        let config = MentorMatchConfig::from_file(file.path()).unwrap();

        assert_eq!(config.index.backend, Backend::Memory);
        assert_eq!(config.index.name, "cohort-2024");
        assert_eq!(config.index.region, "us-east-1");
        assert_eq!(config.matching.top_k, 3);
        assert_eq!(config.matching.dedupe_key, DedupeKey::Name);
        assert_eq!(config.matching.source_text_limit, 1000);
        assert_eq!(config.ready_policy().timeout, Duration::from_secs(5));

        let matching = config.matching_config();
        assert_eq!(matching.namespace.as_deref(), Some("ns1"));
        assert_eq!(config.pinecone_config().namespace, "ns1");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[matching]\ntop_k = \"ten\"").unwrap();

        let err = MentorMatchConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(MentorMatchConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("PINECONE_INDEX_HOST", "responses-abc.svc.pinecone.io"),
            ("MENTORMATCH_INDEX", "override"),
            ("MENTORMATCH_NAMESPACE", "  "),
        ]);

        let mut config = MentorMatchConfig::default();
        config.apply_env(|key| env.get(key).copied().map(String::from));

        assert_eq!(config.provider_config().api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.pinecone_config().api_key.as_deref(), Some("pc-test"));
        assert_eq!(
            config.index.host.as_deref(),
            Some("responses-abc.svc.pinecone.io")
        );
        assert_eq!(config.index_spec().name, "override");
        assert_eq!(config.index.namespace, None);
    }

    #[test]
    fn test_keys_are_not_serialized() {
        let mut config = MentorMatchConfig::default();
        config.embedding.api_key = Some("sk-secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../mentormatch.example.toml");
        let config = MentorMatchConfig::from_file(&path).unwrap();
        assert_eq!(config, MentorMatchConfig::default());
    }

    #[test]
    fn test_dotenv_local_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env.local"),
            "MENTORMATCH_DOTENV_TEST=local\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "MENTORMATCH_DOTENV_TEST=shared\nMENTORMATCH_DOTENV_ONLY=shared\n",
        )
        .unwrap();

        let loaded = load_dotenv(dir.path());

        assert_eq!(
            loaded,
            vec![dir.path().join(".env.local"), dir.path().join(".env")]
        );
        assert_eq!(std::env::var("MENTORMATCH_DOTENV_TEST").unwrap(), "local");
        assert_eq!(std::env::var("MENTORMATCH_DOTENV_ONLY").unwrap(), "shared");
    }

    #[test]
    fn test_missing_dotenv_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv(dir.path()).is_empty());
    }

    #[test]
    fn test_validation() {
        let mut config = MentorMatchConfig::default();
        config.matching.top_k = 0;
        assert!(config.validate().is_err());
    }
}
