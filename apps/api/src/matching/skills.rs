use std::collections::HashSet;

use serde::Serialize;

use crate::models::candidate::Skills;

/// Required-vs-offered skill comparison, used for fallback scoring and for
/// explaining semantic scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkillOverlap {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillOverlap {
    pub fn required_count(&self) -> usize {
        self.matched.len() + self.missing.len()
    }
}

/// Exact, case-sensitive comparison after trimming both sides. Duplicate
/// requirements count once and keep their first position.
pub fn skill_overlap(required: &[String], offered: &Skills) -> SkillOverlap {
    let offered = offered.to_set();
    let mut seen = HashSet::new();
    let mut overlap = SkillOverlap::default();

    for skill in required {
        let skill = skill.trim();
        if skill.is_empty() || !seen.insert(skill) {
            continue;
        }
        if offered.contains(skill) {
            overlap.matched.push(skill.to_string());
        } else {
            overlap.missing.push(skill.to_string());
        }
    }

    overlap
}

/// Comma-joined list, or "none" when empty.
pub fn join_or_none(skills: &[String]) -> String {
    if skills.is_empty() {
        "none".to_string()
    } else {
        skills.join(", ")
    }
}
