//! Pairwise similarity between stored profiles.

use mentormatch_embeddings::cosine_similarity;
use mentormatch_vector_index::QueryMatch;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::error::Result;
use crate::profile::NAME_FIELD;

/// Similarity between two stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub response1_id: String,
    pub response2_id: String,
    pub response1_name: String,
    pub response2_name: String,
    pub similarity_score: f64,
}

/// Connections for every unordered pair of `records`, best first.
///
/// Records returned without values are skipped. Names fall back to the
/// record id when metadata has none.
pub fn build_connections(records: &[QueryMatch]) -> Result<Vec<Connection>> {
    let usable: Vec<(&QueryMatch, &[f32])> = records
        .iter()
        .filter_map(|r| r.values.as_deref().map(|v| (r, v)))
        .collect();

    let mut connections = Vec::new();
    for (i, (a, a_values)) in usable.iter().enumerate() {
        for (b, b_values) in &usable[i + 1..] {
            connections.push(Connection {
                response1_id: a.id.clone(),
                response2_id: b.id.clone(),
                response1_name: display_name(a),
                response2_name: display_name(b),
                similarity_score: cosine_similarity(a_values, b_values)?,
            });
        }
    }

    connections.sort_by_key(|c| Reverse(OrderedFloat(c.similarity_score)));
    Ok(connections)
}

fn display_name(record: &QueryMatch) -> String {
    record
        .metadata_str(NAME_FIELD)
        .unwrap_or(&record.id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored(id: &str, name: Option<&str>, values: Option<Vec<f32>>) -> QueryMatch {
        QueryMatch {
            id: id.to_string(),
            score: Some(0.0),
            values,
            metadata: name.map(|n| {
                let mut m = mentormatch_vector_index::Metadata::new();
                m.insert("name".to_string(), n.into());
                m
            }),
        }
    }

    #[test]
    fn test_pairs_sorted_by_similarity() {
        let records = vec![
            stored("a", Some("Ann"), Some(vec![1.0, 0.0])),
            stored("b", Some("Ben"), Some(vec![0.0, 1.0])),
            stored("c", None, Some(vec![1.0, 0.1])),
        ];

        let connections = build_connections(&records).unwrap();

        assert_eq!(connections.len(), 3);
        assert_eq!(connections[0].response1_id, "a");
        assert_eq!(connections[0].response2_id, "c");
        assert_eq!(connections[0].response2_name, "c");
        assert!(connections[2].similarity_score.abs() < 1e-9);
    }

    #[test]
    fn test_records_without_values_are_skipped() {
        let records = vec![
            stored("a", Some("Ann"), Some(vec![1.0, 0.0])),
            stored("b", Some("Ben"), None),
        ];
        assert!(build_connections(&records).unwrap().is_empty());
    }

    #[test]
    fn test_connection_serializes_camel_case() {
        let connection = Connection {
            response1_id: "a".to_string(),
            response2_id: "b".to_string(),
            response1_name: "Ann".to_string(),
            response2_name: "Ben".to_string(),
            similarity_score: 0.5,
        };
        let value = serde_json::to_value(&connection).unwrap();
        assert_eq!(value["response1Id"], "a");
        assert_eq!(value["similarityScore"], 0.5);
    }
}
