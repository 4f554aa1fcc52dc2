use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    JobRecommendation,
    ProjectRecommendation,
}

impl RecommendationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationKind::JobRecommendation => "job_recommendation",
            RecommendationKind::ProjectRecommendation => "project_recommendation",
        }
    }
}

/// A persisted high-scoring match, unique on `(subject_id, object_id, kind)`.
/// The subject is always the candidate, the object the job or project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub object_id: Uuid,
    pub kind: RecommendationKind,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
