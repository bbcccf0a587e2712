//! Fewest-options-first greedy matching.
//!
//! Matching runs in three phases:
//!
//! 1. **Retrieval**: each mentee's text is embedded and the index is queried
//!    for the nearest mentors. Results are re-checked locally and sorted.
//! 2. **Ordering**: mentees with fewer candidates go first (stable).
//! 3. **Assignment**: each mentee takes its best untaken mentor, falls back to
//!    its best mentor when all are taken, or gets no match.
//!
//! The result is greedy, not a maximum-weight matching.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use mentormatch_embeddings::{EmbeddingProvider, embed_checked};
use mentormatch_vector_index::{MetadataFilter, QueryRequest, VectorIndex};
use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assignment::{Assignment, AssignmentType, Candidate, MenteeCandidates};
use crate::config::{DedupeKey, MatchingConfig};
use crate::error::{MatchError, Result};
use crate::profile::{ProfileInput, Role, TYPE_FIELD};

/// Result of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// One per mentee, in processing order.
    pub assignments: Vec<Assignment>,
    /// Ranked candidates per mentee, in input order.
    pub candidates: Vec<MenteeCandidates>,
}

/// Matches mentees to mentors already stored in a vector index.
pub struct MatchingEngine<E: ?Sized, V: ?Sized> {
    embedder: Arc<E>,
    index: Arc<V>,
    config: MatchingConfig,
}

impl<E, V> MatchingEngine<E, V>
where
    E: EmbeddingProvider + ?Sized,
    V: VectorIndex + ?Sized,
{
    pub fn new(embedder: Arc<E>, index: Arc<V>, config: MatchingConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Produce one assignment per mentee, in processing order.
    ///
    /// Any embedding or index failure aborts the whole run; nothing is
    /// returned for mentees processed before the failure.
    pub async fn match_all(&self, mentees: &[ProfileInput]) -> Result<MatchOutcome> {
        let candidates = self.retrieve_candidates(mentees).await?;
        let assignments = assign(candidates.clone(), self.config.dedupe_key);
        Ok(MatchOutcome {
            assignments,
            candidates,
        })
    }

    /// Phase 1: ranked candidates for every mentee, in input order.
    pub async fn retrieve_candidates(
        &self,
        mentees: &[ProfileInput],
    ) -> Result<Vec<MenteeCandidates>> {
        for mentee in mentees {
            mentee.validate()?;
            if mentee.role != Role::Mentee {
                return Err(MatchError::InvalidProfile(format!(
                    "{} is a {}, not a mentee",
                    mentee.name, mentee.role
                )));
            }
        }

        info!(
            "Fetching up to {} mentor candidates for {} mentees",
            self.config.top_k,
            mentees.len()
        );

        stream::iter(mentees)
            .map(|mentee| async move {
                let candidates = self.candidates_for(mentee).await?;
                Ok::<_, MatchError>(MenteeCandidates::new(mentee, candidates))
            })
            .buffered(self.config.retrieval_concurrency.max(1))
            .try_collect()
            .await
    }

    /// Ranked mentor candidates for one mentee.
    pub async fn candidates_for(&self, mentee: &ProfileInput) -> Result<Vec<Candidate>> {
        let text = mentee.source_text();
        if text.trim().is_empty() {
            warn!("No query text for {}, skipping retrieval", mentee.name);
            return Ok(Vec::new());
        }

        let role = mentee.role.counterpart();
        let vector = embed_checked(self.embedder.as_ref(), &text, self.config.dimension).await?;

        let mut request = QueryRequest::new(vector, self.config.top_k)
            .with_filter(MetadataFilter::eq(TYPE_FIELD, role.as_str()));
        request.namespace = self.config.namespace.clone();

        let matches = self.index.query(request).await?;
        let returned = matches.len();

        let mut candidates: Vec<Candidate> = matches
            .into_iter()
            .filter_map(|m| Candidate::from_match(m, role))
            .collect();
        candidates.sort_by_key(|c| Reverse(OrderedFloat(c.score)));

        if candidates.len() < returned {
            debug!(
                "Dropped {} unusable matches for {}",
                returned - candidates.len(),
                mentee.name
            );
        }
        debug!(
            "Found {} valid candidates for {}",
            candidates.len(),
            mentee.name
        );

        Ok(candidates)
    }
}

/// Phases 2 and 3: order mentees by scarcity and assign greedily.
pub fn assign(mut mentees: Vec<MenteeCandidates>, key: DedupeKey) -> Vec<Assignment> {
    mentees.sort_by_key(|m| m.candidates.len());

    let mut taken: HashSet<String> = HashSet::new();
    let mut assignments = Vec::with_capacity(mentees.len());

    for mentee in &mentees {
        let unique = mentee
            .candidates
            .iter()
            .find(|c| !taken.contains(c.key(key)));

        let assignment = if let Some(mentor) = unique {
            taken.insert(mentor.key(key).to_string());
            info!(
                "Assigned {} ==> {} (score {:.3}, unique)",
                mentee.mentee_name, mentor.name, mentor.score
            );
            Assignment::matched(mentee, mentor, AssignmentType::Unique)
        } else if let Some(best) = mentee.candidates.first() {
            info!(
                "Assigned {} ==> {} (score {:.3}, shared fallback)",
                mentee.mentee_name, best.name, best.score
            );
            Assignment::matched(mentee, best, AssignmentType::SharedFallback)
        } else {
            warn!("No suitable mentor found for {}", mentee.mentee_name);
            Assignment::unmatched(mentee)
        };

        assignments.push(assignment);
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(id: &str, name: &str, score: f64) -> Candidate {
        let mut metadata = mentormatch_vector_index::Metadata::new();
        metadata.insert("type".to_string(), "mentor".into());
        metadata.insert("name".to_string(), name.into());
        metadata.insert("expertise".to_string(), format!("{name} things").into());
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            score,
            metadata,
        }
    }

    fn mentee(name: &str, candidates: Vec<Candidate>) -> MenteeCandidates {
        MenteeCandidates {
            mentee_id: format!("mentee-{}", name.to_lowercase()),
            mentee_name: name.to_string(),
            mentee_interests: None,
            candidates,
        }
    }

    fn summary(assignments: &[Assignment]) -> Vec<(&str, Option<&str>, AssignmentType)> {
        assignments
            .iter()
            .map(|a| {
                (
                    a.mentee_name.as_str(),
                    a.mentor_id.as_deref(),
                    a.assignment_type,
                )
            })
            .collect()
    }

    #[test]
    fn test_scarcity_order_changes_outcome() {
        // L1 prefers M1 but can also take M2; L2 can only take M1.
        let l1 = mentee(
            "L1",
            vec![candidate("m1", "M1", 0.9), candidate("m2", "M2", 0.7)],
        );
        let l2 = mentee("L2", vec![candidate("m1", "M1", 0.95)]);

        let assignments = assign(vec![l1, l2], DedupeKey::Id);

        assert_eq!(
            summary(&assignments),
            vec![
                ("L2", Some("m1"), AssignmentType::Unique),
                ("L1", Some("m2"), AssignmentType::Unique),
            ]
        );
        assert_eq!(assignments[1].score, Some(0.7));
        assert_eq!(assignments[1].mentor_expertise.as_deref(), Some("M2 things"));
    }

    #[test]
    fn test_identical_single_candidate_falls_back_to_shared() {
        let a = mentee("A", vec![candidate("m1", "M1", 0.6)]);
        let b = mentee("B", vec![candidate("m1", "M1", 0.8)]);

        let assignments = assign(vec![a, b], DedupeKey::Id);

        assert_eq!(
            summary(&assignments),
            vec![
                ("A", Some("m1"), AssignmentType::Unique),
                ("B", Some("m1"), AssignmentType::SharedFallback),
            ]
        );
        assert_eq!(assignments[1].score, Some(0.8));
    }

    #[test]
    fn test_empty_candidates_yield_no_match() {
        let assignments = assign(
            vec![mentee("A", Vec::new()), mentee("B", Vec::new())],
            DedupeKey::Id,
        );

        assert_eq!(assignments.len(), 2);
        for a in &assignments {
            assert_eq!(a.assignment_type, AssignmentType::NoMatchFound);
            assert!(a.mentor_id.is_none());
            assert!(a.mentor_name.is_none());
            assert!(a.score.is_none());
        }
    }

    #[test]
    fn test_no_match_mentees_are_processed_first() {
        let assignments = assign(
            vec![
                mentee("Has", vec![candidate("m1", "M1", 0.5)]),
                mentee("None", Vec::new()),
            ],
            DedupeKey::Id,
        );
        assert_eq!(assignments[0].mentee_name, "None");
        assert_eq!(assignments[1].assignment_type, AssignmentType::Unique);
    }

    #[test]
    fn test_same_named_mentors_by_id_and_by_name() {
        let first = mentee("A", vec![candidate("mentor-1", "Pat Kim", 0.9)]);
        let second = mentee(
            "B",
            vec![
                candidate("mentor-1", "Pat Kim", 0.9),
                candidate("mentor-2", "Pat Kim", 0.8),
            ],
        );

        let by_id = assign(vec![first.clone(), second.clone()], DedupeKey::Id);
        assert_eq!(by_id[1].mentor_id.as_deref(), Some("mentor-2"));
        assert_eq!(by_id[1].assignment_type, AssignmentType::Unique);

        let by_name = assign(vec![first, second], DedupeKey::Name);
        assert_eq!(by_name[1].mentor_id.as_deref(), Some("mentor-1"));
        assert_eq!(by_name[1].assignment_type, AssignmentType::SharedFallback);
    }

    #[test]
    fn test_ties_in_length_keep_input_order() {
        let assignments = assign(
            vec![
                mentee("First", vec![candidate("m1", "M1", 0.1), candidate("m2", "M2", 0.05)]),
                mentee("Second", vec![candidate("m1", "M1", 0.9), candidate("m2", "M2", 0.8)]),
            ],
            DedupeKey::Id,
        );

        assert_eq!(
            summary(&assignments),
            vec![
                ("First", Some("m1"), AssignmentType::Unique),
                ("Second", Some("m2"), AssignmentType::Unique),
            ]
        );
    }
}
