//! Command execution.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use mentormatch_embeddings::{EmbeddingProvider, OpenAIProvider};
use mentormatch_engine::{
    MatchOutcome, MatchingEngine, MetadataFilter, ProfileInput, ProfileStore, Role, StoreOutcome,
};
use mentormatch_vector_index::{InMemoryIndex, PineconeIndex, VectorIndex};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cli::Command;
use crate::config::{Backend, MentorMatchConfig};
use crate::output;

/// Profiles for a full demo run.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub mentors: Vec<ProfileInput>,
    pub mentees: Vec<ProfileInput>,
}

impl Fixture {
    /// Check every profile sits in the list matching its role.
    pub fn validate(&self) -> Result<()> {
        for (profiles, role) in [(&self.mentors, Role::Mentor), (&self.mentees, Role::Mentee)] {
            if let Some(p) = profiles.iter().find(|p| p.role != role) {
                bail!("{} is listed as a {role} but has role {}", p.name, p.role);
            }
        }
        Ok(())
    }
}

/// Clients wired from configuration.
pub struct App {
    config: MentorMatchConfig,
    embedder: Arc<OpenAIProvider>,
    index: Arc<dyn VectorIndex>,
    store: ProfileStore<OpenAIProvider, dyn VectorIndex>,
    engine: MatchingEngine<OpenAIProvider, dyn VectorIndex>,
}

impl App {
    pub fn from_config(config: MentorMatchConfig) -> Result<Self> {
        let embedder = Arc::new(
            OpenAIProvider::new(config.provider_config())
                .context("Failed to build the embedding client")?,
        );

        let index: Arc<dyn VectorIndex> = match config.index.backend {
            Backend::Memory => Arc::new(
                InMemoryIndex::new(config.index.name.clone(), config.embedding.dimension)
                    .with_default_namespace(config.index.namespace.clone().unwrap_or_default()),
            ),
            Backend::Pinecone => Arc::new(
                PineconeIndex::new(config.pinecone_config())
                    .context("Failed to build the Pinecone client")?,
            ),
        };

        let matching = config.matching_config();
        let store = ProfileStore::new(embedder.clone(), index.clone(), matching.clone())
            .with_index_spec(config.index_spec());
        let engine = MatchingEngine::new(embedder.clone(), index.clone(), matching);

        Ok(Self {
            config,
            embedder,
            index,
            store,
            engine,
        })
    }

    pub fn store(&self) -> &ProfileStore<OpenAIProvider, dyn VectorIndex> {
        &self.store
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        if self.config.index.backend == Backend::Memory && !matches!(command, Command::Demo { .. })
        {
            warn!("The memory backend keeps no records between runs");
        }

        match command {
            Command::Init => self.init().await,
            Command::Store { path } => self.store_file(&path).await,
            Command::Match { path, json } => self.match_file(&path, json).await,
            Command::Reset => self.reset().await,
            Command::Similarity { id1, id2 } => self.similarity(&id1, &id2).await,
            Command::Connections { field, value, json } => {
                self.connections(field, value, json).await
            }
            Command::Demo { path, json } => {
                let fixture: Fixture = read_json(&path)?;
                let outcome = self.run_demo(&fixture).await?;
                print_outcome(&outcome, json)
            }
        }
    }

    async fn init(&self) -> Result<()> {
        let name = self.index.name();
        if self.store.ensure_index().await? {
            println!("Created index {name}");
        } else {
            println!("Index {name} already exists");
        }
        Ok(())
    }

    async fn store_file(&self, path: &Path) -> Result<()> {
        let profiles: Vec<ProfileInput> = read_json(path)?;
        self.require_embedder()?;

        let outcomes = self.store.store_all(&profiles).await?;
        let stored = outcomes
            .iter()
            .filter(|o| matches!(o, StoreOutcome::Stored { .. }))
            .count();
        println!(
            "Stored {stored} profile(s), skipped {}",
            outcomes.len() - stored
        );
        Ok(())
    }

    async fn match_file(&self, path: &Path, json: bool) -> Result<()> {
        let mentees: Vec<ProfileInput> = read_json(path)?;
        self.require_embedder()?;

        let outcome = self.engine.match_all(&mentees).await?;
        print_outcome(&outcome, json)
    }

    async fn reset(&self) -> Result<()> {
        self.store.reset().await?;
        println!("Cleared index {}", self.index.name());
        Ok(())
    }

    async fn similarity(&self, id1: &str, id2: &str) -> Result<()> {
        let score = self.store.similarity_between(id1, id2).await?;
        println!("{id1} <-> {id2}: {score:.4}");
        Ok(())
    }

    async fn connections(&self, field: String, value: String, json: bool) -> Result<()> {
        let connections = self
            .store
            .connections(MetadataFilter::eq(field, value), None)
            .await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&connections)?);
        } else {
            print!("{}", output::render_connections(&connections));
        }
        Ok(())
    }

    /// Clear, create, store both sides, wait for indexing and match.
    pub async fn run_demo(&self, fixture: &Fixture) -> Result<MatchOutcome> {
        fixture.validate()?;
        self.require_embedder()?;
        let name = self.index.name();
        let namespace = self.config.index.namespace.as_deref();
        let policy = self.config.ready_policy();

        info!("Clearing index {name} for a fresh run");
        self.store.reset().await.context("Failed to clear the index")?;

        info!("Initializing index {name}");
        self.store.ensure_index().await?;
        self.index
            .wait_for_records(0, policy, namespace)
            .await
            .context("Index did not finish clearing")?;

        info!("Storing {} mentors", fixture.mentors.len());
        let mut outcomes = self.store.store_all(&fixture.mentors).await?;
        info!("Storing {} mentees", fixture.mentees.len());
        outcomes.extend(self.store.store_all(&fixture.mentees).await?);

        let expected = outcomes
            .iter()
            .filter_map(|o| match o {
                StoreOutcome::Stored { id } => Some(id.as_str()),
                StoreOutcome::Skipped { .. } => None,
            })
            .collect::<HashSet<_>>()
            .len() as u64;

        info!("Waiting for {expected} records to be indexed");
        self.index
            .wait_for_records(expected, policy, namespace)
            .await
            .context("Index did not become ready")?;

        info!("Matching {} mentees", fixture.mentees.len());
        Ok(self.engine.match_all(&fixture.mentees).await?)
    }

    fn require_embedder(&self) -> Result<()> {
        if !self.embedder.is_available() {
            bail!("OPENAI_API_KEY is not set");
        }
        Ok(())
    }
}

fn print_outcome(outcome: &MatchOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.assignments)?);
    } else {
        print!("{}", output::render_candidates(&outcome.candidates));
        println!();
        print!("{}", output::render_summary(&outcome.assignments));
    }
    Ok(())
}

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
