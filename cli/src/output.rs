//! Human readable reports.

use std::fmt::Write;

use mentormatch_engine::{Assignment, AssignmentType, Connection, MenteeCandidates};

const NOT_AVAILABLE: &str = "N/A";

/// Candidate lists, top three per mentee.
pub fn render_candidates(candidates: &[MenteeCandidates]) -> String {
    let mut out = String::new();
    for entry in candidates {
        let _ = writeln!(
            out,
            "- {}: {} potential mentor(s)",
            entry.mentee_name,
            entry.candidates.len()
        );
        let top: Vec<String> = entry
            .candidates
            .iter()
            .take(3)
            .map(|c| format!("{} (Score: {:.3})", c.name, c.score))
            .collect();
        if !top.is_empty() {
            let _ = writeln!(out, "    Top: {}", top.join(", "));
        }
    }
    out
}

/// Final assignment summary.
pub fn render_summary(assignments: &[Assignment]) -> String {
    let mut out = String::from("--- Final Match Assignment Summary ---\n");

    if assignments.is_empty() {
        out.push_str("   No mentees were processed.\n");
    }

    for a in assignments {
        match (&a.mentor_name, a.score) {
            (Some(mentor), Some(score)) => {
                let _ = writeln!(
                    out,
                    "   {}  ==>  {} (Score: {:.1}%, Type: {})",
                    a.mentee_name,
                    mentor,
                    score * 100.0,
                    a.assignment_type
                );
                let _ = writeln!(
                    out,
                    "        Interests: {}",
                    a.mentee_interests.as_deref().unwrap_or(NOT_AVAILABLE)
                );
                let _ = writeln!(
                    out,
                    "        Expertise: {}",
                    a.mentor_expertise.as_deref().unwrap_or(NOT_AVAILABLE)
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "   {}  ==>  NO MENTOR ASSIGNED ({})",
                    a.mentee_name, a.assignment_type
                );
            }
        }
    }

    let count = |kind: AssignmentType| {
        assignments
            .iter()
            .filter(|a| a.assignment_type == kind)
            .count()
    };
    let _ = writeln!(
        out,
        "   Unique: {}, Shared: {}, Unmatched: {}",
        count(AssignmentType::Unique),
        count(AssignmentType::SharedFallback),
        count(AssignmentType::NoMatchFound)
    );
    out.push_str("----------------------------------\n");
    out
}

/// One line per connection.
pub fn render_connections(connections: &[Connection]) -> String {
    if connections.is_empty() {
        return "No connections found.\n".to_string();
    }

    let mut out = String::new();
    for (i, c) in connections.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} <-> {} ({:.1}%)",
            i + 1,
            c.response1_name,
            c.response2_name,
            c.similarity_score * 100.0
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assignment(mentee: &str, mentor: Option<(&str, f64)>, kind: AssignmentType) -> Assignment {
        Assignment {
            mentee_id: format!("mentee-{mentee}"),
            mentee_name: mentee.to_string(),
            mentor_id: mentor.map(|(name, _)| format!("mentor-{name}")),
            mentor_name: mentor.map(|(name, _)| name.to_string()),
            score: mentor.map(|(_, score)| score),
            assignment_type: kind,
            mentor_expertise: mentor.map(|_| "Startups".to_string()),
            mentee_interests: None,
        }
    }

    #[test]
    fn test_summary() {
        let summary = render_summary(&[
            assignment("Emily", Some(("Jason", 0.8123)), AssignmentType::Unique),
            assignment("Carlos", Some(("Jason", 0.5)), AssignmentType::SharedFallback),
            assignment("Ana", None, AssignmentType::NoMatchFound),
        ]);

        assert!(summary.contains("   Emily  ==>  Jason (Score: 81.2%, Type: Unique)\n"));
        assert!(summary.contains("Type: Shared (Fallback)"));
        assert!(summary.contains("   Ana  ==>  NO MENTOR ASSIGNED (No Match Found)\n"));
        assert!(summary.contains("        Interests: N/A\n"));
        assert!(summary.contains("Unique: 1, Shared: 1, Unmatched: 1"));
    }

    #[test]
    fn test_empty_connections() {
        assert_eq!(render_connections(&[]), "No connections found.\n");
    }
}
