//! Fallback scorer: skill overlap plus an exact location bonus.
//!
//! Used whenever a semantic score cannot be computed. Pure and infallible.

use serde::Serialize;

use crate::matching::skills::{join_or_none, skill_overlap, SkillOverlap};
use crate::models::candidate::{Candidate, Skills};
use crate::models::postable::Postable;

/// Skill component when the postable lists no requirements at all.
pub const NO_REQUIREMENTS_SKILL_SCORE: f64 = 50.0;
pub const LOCATION_BONUS: f64 = 10.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackScore {
    pub score: f64,
    pub overlap: SkillOverlap,
    pub location_matched: bool,
}

impl FallbackScore {
    /// Short explanation: matched count against required count.
    pub fn summary(&self) -> String {
        let required = self.overlap.required_count();
        let mut text = if required == 0 {
            "No required skills listed; default skill score applied.".to_string()
        } else {
            format!(
                "Matched {} of {} required skills.",
                self.overlap.matched.len(),
                required
            )
        };
        if self.location_matched {
            text.push_str(" Location match bonus applied.");
        }
        text
    }

    /// Summary plus the matched and missing skill names.
    pub fn detailed_explanation(&self) -> String {
        format!(
            "Keyword match score: {:.1}%. {} Matched skills: {}. Missing skills: {}.",
            self.score,
            self.summary(),
            join_or_none(&self.overlap.matched),
            join_or_none(&self.overlap.missing)
        )
    }
}

/// Scores required skills against offered skills.
///
/// `skill = |matched| / |required| × 100` (50.0 when nothing is required),
/// `+10` when both locations are present and exactly equal, capped at 100.
pub fn fallback_score(
    required: &[String],
    offered: &Skills,
    postable_location: Option<&str>,
    candidate_location: Option<&str>,
) -> FallbackScore {
    let overlap = skill_overlap(required, offered);

    let skill_score = match overlap.required_count() {
        0 => NO_REQUIREMENTS_SKILL_SCORE,
        required => overlap.matched.len() as f64 / required as f64 * 100.0,
    };

    let location_matched = matches!(
        (postable_location, candidate_location),
        (Some(p), Some(c)) if !p.is_empty() && p == c
    );
    let bonus = if location_matched { LOCATION_BONUS } else { 0.0 };

    FallbackScore {
        score: (skill_score + bonus).clamp(0.0, MAX_SCORE),
        overlap,
        location_matched,
    }
}

pub fn score_pair(postable: &Postable, candidate: &Candidate) -> FallbackScore {
    fallback_score(
        postable.required_skills(),
        &candidate.skills,
        postable.location(),
        candidate.location.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_requirements_no_skills_mismatched_location_is_fifty() {
        let result = fallback_score(&[], &Skills::default(), Some("Remote"), Some("Berlin"));
        assert_eq!(result.score, 50.0);
        assert!(!result.location_matched);
    }

    #[test]
    fn test_no_requirements_no_skills_matching_location_is_sixty() {
        let result = fallback_score(&[], &Skills::default(), Some("Remote"), Some("Remote"));
        assert_eq!(result.score, 60.0);
        assert!(result.location_matched);
    }

    #[test]
    fn test_example_python_docker_remote() {
        let result = fallback_score(
            &list(&["Python", "Docker"]),
            &Skills::List(list(&["Python", "Go"])),
            Some("Remote"),
            Some("Remote"),
        );
        assert_eq!(result.score, 60.0);
        assert_eq!(result.overlap.matched, list(&["Python"]));
        assert_eq!(result.overlap.missing, list(&["Docker"]));

        let explanation = result.detailed_explanation();
        assert!(explanation.contains("Matched 1 of 2 required skills"));
        assert!(explanation.contains("Matched skills: Python."));
        assert!(explanation.contains("Missing skills: Docker."));
    }

    #[test]
    fn test_full_match_with_location_is_capped_at_hundred() {
        let result = fallback_score(
            &list(&["Rust"]),
            &Skills::List(list(&["Rust"])),
            Some("Oslo"),
            Some("Oslo"),
        );
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_location_match_is_exact_and_case_sensitive() {
        let skills = Skills::default();
        assert!(!fallback_score(&[], &skills, Some("remote"), Some("Remote")).location_matched);
        assert!(!fallback_score(&[], &skills, Some("Remote, US"), Some("Remote")).location_matched);
        assert!(!fallback_score(&[], &skills, None, Some("Remote")).location_matched);
        assert!(!fallback_score(&[], &skills, Some(""), Some("")).location_matched);
    }

    #[test]
    fn test_score_always_within_bounds() {
        let cases: Vec<(Vec<String>, Vec<String>)> = vec![
            (list(&[]), list(&[])),
            (list(&["A"]), list(&[])),
            (list(&["A", "B", "C"]), list(&["A", "B", "C", "D"])),
            (list(&["A", "A", "B"]), list(&["A"])),
        ];
        for (required, offered) in cases {
            for (p, c) in [(Some("X"), Some("X")), (Some("X"), Some("Y")), (None, None)] {
                let score = fallback_score(&required, &Skills::List(offered.clone()), p, c).score;
                assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            }
        }
    }

    #[test]
    fn test_categorized_skills_are_flattened() {
        let mut groups = std::collections::BTreeMap::new();
        groups.insert("backend".to_string(), list(&["Go"]));
        groups.insert("ops".to_string(), list(&["Docker"]));
        let result = fallback_score(&list(&["Docker", "Go"]), &Skills::Categorized(groups), None, None);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_summary_for_empty_requirements() {
        let result = fallback_score(&[], &Skills::default(), None, None);
        assert!(result.summary().contains("No required skills"));
    }
}
