//! Mentor and mentee profiles.
//!
//! A profile is embedded from a single text built out of its role specific
//! fields and stored under an id derived from its role and name.

use mentormatch_embeddings::Embedding;
use mentormatch_vector_index::{Metadata, VectorRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MatchError, Result};

/// Metadata field holding the role tag.
pub const TYPE_FIELD: &str = "type";

/// Metadata field holding the display name.
pub const NAME_FIELD: &str = "name";

/// Metadata field holding the (truncated) embedded text.
pub const SOURCE_TEXT_FIELD: &str = "originalText";

/// Role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mentee,
}

impl Role {
    /// Tag stored in record metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mentor => "mentor",
            Self::Mentee => "mentee",
        }
    }

    /// The role this one is matched against.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Mentor => Self::Mentee,
            Self::Mentee => Self::Mentor,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted profile, before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(alias = "fullName")]
    pub name: String,

    pub role: Role,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, alias = "shortTermCareerGoals")]
    pub short_term_goals: Option<String>,

    #[serde(default, alias = "longTermCareerAspirations")]
    pub long_term_goals: Option<String>,

    #[serde(default)]
    pub interests: Vec<String>,

    #[serde(default, alias = "whyBeAMentor")]
    pub why_mentor: Option<String>,

    #[serde(default)]
    pub expertise: Vec<String>,

    /// Additional metadata copied onto the stored record.
    #[serde(default)]
    pub extra: Metadata,
}

impl ProfileInput {
    /// A mentee with goals and interests.
    pub fn mentee(
        name: impl Into<String>,
        goals: impl Into<String>,
        interests: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            short_term_goals: Some(goals.into()),
            interests: interests.into_iter().map(Into::into).collect(),
            ..Self::empty(name, Role::Mentee)
        }
    }

    /// A mentor with a motivation statement and expertise.
    pub fn mentor(
        name: impl Into<String>,
        why_mentor: impl Into<String>,
        expertise: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            why_mentor: Some(why_mentor.into()),
            expertise: expertise.into_iter().map(Into::into).collect(),
            ..Self::empty(name, Role::Mentor)
        }
    }

    /// A profile with only a name and role.
    pub fn empty(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            email: None,
            short_term_goals: None,
            long_term_goals: None,
            interests: Vec::new(),
            why_mentor: None,
            expertise: Vec::new(),
            extra: Metadata::new(),
        }
    }

    /// Stable record id.
    pub fn id(&self) -> String {
        profile_id(self.role, &self.name)
    }

    /// Reject profiles that cannot be stored or matched.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MatchError::InvalidProfile(format!(
                "{} profile has an empty name",
                self.role
            )));
        }
        Ok(())
    }

    /// Text embedded for this profile; also the mentee query text.
    ///
    /// Mentees: `Goals: <short> <long> Interests: <a, b>`.
    /// Mentors: `<why> Expertise: <a, b>`. Empty sections are left out, so
    /// a profile with no content yields an empty string.
    pub fn source_text(&self) -> String {
        let mut parts = Vec::new();
        match self.role {
            Role::Mentee => {
                let goals = join_present([&self.short_term_goals, &self.long_term_goals]);
                if !goals.is_empty() {
                    parts.push(format!("Goals: {goals}"));
                }
                if let Some(interests) = joined(&self.interests) {
                    parts.push(format!("Interests: {interests}"));
                }
            }
            Role::Mentor => {
                let why = join_present([&self.why_mentor]);
                if !why.is_empty() {
                    parts.push(why);
                }
                if let Some(expertise) = joined(&self.expertise) {
                    parts.push(format!("Expertise: {expertise}"));
                }
            }
        }
        parts.join(" ")
    }

    /// Role specific display field (`expertise` or `interests`), comma joined.
    pub fn highlights(&self) -> Option<String> {
        match self.role {
            Role::Mentor => joined(&self.expertise),
            Role::Mentee => joined(&self.interests),
        }
    }

    /// Metadata stored with this profile's vector.
    ///
    /// `extra` entries are copied first so the reserved fields always win.
    pub fn metadata(&self, source_text: &str, source_text_limit: usize) -> Metadata {
        let mut metadata = self.extra.clone();

        if let Some(email) = &self.email {
            metadata.insert("email".to_string(), Value::from(email.as_str()));
        }
        if let Some(highlights) = self.highlights() {
            let field = match self.role {
                Role::Mentor => "expertise",
                Role::Mentee => "interests",
            };
            metadata.insert(field.to_string(), Value::from(highlights));
        }

        metadata.insert(TYPE_FIELD.to_string(), Value::from(self.role.as_str()));
        metadata.insert(NAME_FIELD.to_string(), Value::from(self.name.as_str()));
        metadata.insert(
            SOURCE_TEXT_FIELD.to_string(),
            Value::from(truncate_chars(source_text, source_text_limit)),
        );
        metadata
    }
}

/// An embedded profile ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub vector: Embedding,
    /// Embedded text, truncated for storage.
    pub source_text: String,
    pub metadata: Metadata,
}

impl ProfileRecord {
    /// Assemble a record from a profile and the vector of its full text.
    pub fn new(
        profile: &ProfileInput,
        vector: Embedding,
        source_text: &str,
        source_text_limit: usize,
    ) -> Self {
        Self {
            id: profile.id(),
            role: profile.role,
            name: profile.name.clone(),
            vector,
            source_text: truncate_chars(source_text, source_text_limit).to_string(),
            metadata: profile.metadata(source_text, source_text_limit),
        }
    }

    pub fn into_vector_record(self) -> VectorRecord {
        VectorRecord::new(self.id, self.vector).with_metadata(self.metadata)
    }
}

/// Record id for a profile: `<role>-<slug>`.
///
/// The slug keeps ASCII letters, digits, whitespace and hyphens, turns
/// whitespace runs into a single hyphen and lowercases the result. Distinct
/// names can collide; the later write wins.
pub fn profile_id(role: Role, name: &str) -> String {
    let kept: String = name
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{}-{}", role.as_str(), slug.to_lowercase())
}

/// At most `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn joined(items: &[String]) -> Option<String> {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then(|| items.join(", "))
}

fn join_present<const N: usize>(fields: [&Option<String>; N]) -> String {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
