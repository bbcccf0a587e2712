//! # Matching Engine
//!
//! This crate pairs mentees with mentors stored in a vector index:
//!
//! - **Profiles**: Role specific text, stable ids and record metadata
//! - **Profile Store**: Embed, store, look up and compare profiles
//! - **Matching**: Greedy fewest-options-first assignment
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Matching Engine                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ProfileInput ──► ProfileStore ──► VectorIndex (mentors)        │
//! │                                          │                      │
//! │  mentees ──► embed ──► query(type=mentor) ┘                     │
//! │                 │                                               │
//! │                 ▼                                               │
//! │        MenteeCandidates ──► assign() ──► Assignment             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mentormatch_engine::{MatchingConfig, MatchingEngine, ProfileStore};
//!
//! let store = ProfileStore::new(embedder.clone(), index.clone(), config.clone());
//! store.ensure_index().await?;
//! store.store_all(&mentors).await?;
//!
//! let engine = MatchingEngine::new(embedder, index, config);
//! let outcome = engine.match_all(&mentees).await?;
//! ```

pub mod assignment;
pub mod config;
pub mod connections;
pub mod error;
pub mod matcher;
pub mod profile;
pub mod store;

pub use assignment::{Assignment, AssignmentType, Candidate, MenteeCandidates};
pub use config::{DedupeKey, MatchingConfig};
pub use connections::{Connection, build_connections};
pub use error::{MatchError, Result};
pub use matcher::{MatchOutcome, MatchingEngine, assign};
pub use profile::{ProfileInput, ProfileRecord, Role, profile_id};
pub use store::{ProfileStore, StoreOutcome};

// Re-export from dependencies for convenience
pub use mentormatch_embeddings::ErrorKind;
pub use mentormatch_vector_index::MetadataFilter;
