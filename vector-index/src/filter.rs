//! Metadata filters for similarity queries.
//!
//! Only equality and set membership are supported. Filters are evaluated
//! locally by the in-memory index and rendered to the Pinecone operator
//! syntax (`$eq`, `$in`, `$and`) for the remote one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Metadata;
use crate::error::{IndexError, Result};

/// A predicate over record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFilter {
    /// `field == value`
    Eq { field: String, value: Value },

    /// `field` is one of `values`
    In { field: String, values: Vec<Value> },

    /// Every inner filter holds.
    And(Vec<MetadataFilter>),
}

impl MetadataFilter {
    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Set membership predicate.
    pub fn one_of<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `self` and `other`.
    pub fn and(self, other: MetadataFilter) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Reject filters that cannot be sent to an index.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Eq { field, .. } => validate_field(field),
            Self::In { field, values } => {
                validate_field(field)?;
                if values.is_empty() {
                    return Err(IndexError::Validation(format!(
                        "set filter on `{field}` has no values"
                    )));
                }
                Ok(())
            }
            Self::And(filters) => {
                if filters.is_empty() {
                    return Err(IndexError::Validation(
                        "conjunction has no filters".to_string(),
                    ));
                }
                filters.iter().try_for_each(Self::validate)
            }
        }
    }

    /// Evaluate the filter against a record's metadata.
    ///
    /// A list-valued field matches when any element matches.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Eq { field, value } => field_matches(metadata, field, |v| v == value),
            Self::In { field, values } => field_matches(metadata, field, |v| values.contains(v)),
            Self::And(filters) => filters.iter().all(|f| f.matches(metadata)),
        }
    }

    /// Render to the Pinecone filter language.
    pub fn to_pinecone(&self) -> Value {
        match self {
            Self::Eq { field, value } => serde_json::json!({ field.as_str(): { "$eq": value } }),
            Self::In { field, values } => serde_json::json!({ field.as_str(): { "$in": values } }),
            Self::And(filters) => {
                let rendered: Vec<Value> = filters.iter().map(Self::to_pinecone).collect();
                serde_json::json!({ "$and": rendered })
            }
        }
    }
}

fn validate_field(field: &str) -> Result<()> {
    if field.trim().is_empty() {
        return Err(IndexError::Validation(
            "filter field name is empty".to_string(),
        ));
    }
    if field.starts_with('$') {
        return Err(IndexError::Validation(format!(
            "filter field `{field}` looks like an operator"
        )));
    }
    Ok(())
}

fn field_matches(metadata: &Metadata, field: &str, pred: impl Fn(&Value) -> bool) -> bool {
    match metadata.get(field) {
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(value) => pred(value),
        None => false,
    }
}
