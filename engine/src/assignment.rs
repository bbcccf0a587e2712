//! Candidates and assignments.

use mentormatch_vector_index::{Metadata, QueryMatch};
use serde::{Deserialize, Serialize};

use crate::config::DedupeKey;
use crate::profile::{NAME_FIELD, ProfileInput, Role, TYPE_FIELD};

/// A viable mentor for one mentee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub metadata: Metadata,
}

impl Candidate {
    /// Accept a raw index match when it has a name, a finite score and the
    /// expected role.
    pub fn from_match(m: QueryMatch, role: Role) -> Option<Self> {
        let score = m.score.filter(|s| s.is_finite())?;
        if m.metadata_str(TYPE_FIELD) != Some(role.as_str()) {
            return None;
        }
        let name = m
            .metadata_str(NAME_FIELD)
            .map(str::trim)
            .filter(|n| !n.is_empty())?
            .to_string();

        Some(Self {
            id: m.id,
            name,
            score,
            metadata: m.metadata.unwrap_or_default(),
        })
    }

    /// Value used to detect an already assigned mentor.
    pub fn key(&self, key: DedupeKey) -> &str {
        match key {
            DedupeKey::Id => &self.id,
            DedupeKey::Name => &self.name,
        }
    }

    /// String metadata field, if present.
    pub fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(serde_json::Value::as_str)
    }
}

/// A mentee with its ranked candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenteeCandidates {
    pub mentee_id: String,
    pub mentee_name: String,
    pub mentee_interests: Option<String>,
    /// Sorted by descending score.
    pub candidates: Vec<Candidate>,
}

impl MenteeCandidates {
    pub fn new(mentee: &ProfileInput, candidates: Vec<Candidate>) -> Self {
        Self {
            mentee_id: mentee.id(),
            mentee_name: mentee.name.clone(),
            mentee_interests: mentee.highlights(),
            candidates,
        }
    }
}

/// How a mentee ended up with its mentor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    /// The mentor was not assigned to anyone processed earlier.
    Unique,
    /// Every candidate was taken; the best one is shared.
    SharedFallback,
    /// The mentee had no viable candidates.
    NoMatchFound,
}

impl std::fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unique => "Unique",
            Self::SharedFallback => "Shared (Fallback)",
            Self::NoMatchFound => "No Match Found",
        };
        f.write_str(label)
    }
}

/// Final result for one mentee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub mentee_id: String,
    pub mentee_name: String,
    pub mentor_id: Option<String>,
    pub mentor_name: Option<String>,
    pub score: Option<f64>,
    pub assignment_type: AssignmentType,
    pub mentor_expertise: Option<String>,
    pub mentee_interests: Option<String>,
}

impl Assignment {
    pub(crate) fn matched(
        mentee: &MenteeCandidates,
        mentor: &Candidate,
        assignment_type: AssignmentType,
    ) -> Self {
        Self {
            mentee_id: mentee.mentee_id.clone(),
            mentee_name: mentee.mentee_name.clone(),
            mentor_id: Some(mentor.id.clone()),
            mentor_name: Some(mentor.name.clone()),
            score: Some(mentor.score),
            assignment_type,
            mentor_expertise: mentor.metadata_str("expertise").map(str::to_string),
            mentee_interests: mentee.mentee_interests.clone(),
        }
    }

    pub(crate) fn unmatched(mentee: &MenteeCandidates) -> Self {
        Self {
            mentee_id: mentee.mentee_id.clone(),
            mentee_name: mentee.mentee_name.clone(),
            mentor_id: None,
            mentor_name: None,
            score: None,
            assignment_type: AssignmentType::NoMatchFound,
            mentor_expertise: None,
            mentee_interests: mentee.mentee_interests.clone(),
        }
    }
}
