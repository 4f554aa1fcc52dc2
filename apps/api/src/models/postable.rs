use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recommendation::RecommendationKind;
use super::{null_as_default, StoredEmbedding};
use crate::embedding::text::{compose_job_text, compose_project_text};
use crate::store::{Document, JOBS, PROJECTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostableKind {
    Job,
    Project,
}

impl PostableKind {
    pub fn label(self) -> &'static str {
        match self {
            PostableKind::Job => "job",
            PostableKind::Project => "project",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            PostableKind::Job => JOBS,
            PostableKind::Project => PROJECTS,
        }
    }

    pub fn recommendation_kind(self) -> RecommendationKind {
        match self {
            PostableKind::Job => RecommendationKind::JobRecommendation,
            PostableKind::Project => RecommendationKind::ProjectRecommendation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Opaque reference to the owning account; never interpreted here.
    #[serde(default)]
    pub owner_id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nice_to_have: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(flatten)]
    pub embedding: StoredEmbedding,
}

impl Job {
    /// Fields that feed the searchable text. Changing any of them stales the embedding.
    pub const TEXT_FIELDS: &'static [&'static str] = &[
        "title",
        "company",
        "description",
        "requirements",
        "required_skills",
        "nice_to_have",
        "location",
        "employment_type",
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    /// Opaque reference to the owning account; never interpreted here.
    #[serde(default)]
    pub owner_id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills_required: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(flatten)]
    pub embedding: StoredEmbedding,
}

impl Project {
    pub const TEXT_FIELDS: &'static [&'static str] = &[
        "title",
        "company",
        "description",
        "skills_required",
        "required_skills",
        "tech_stack",
        "location",
        "duration",
    ];
}

/// A job or project a candidate can be matched against.
#[derive(Debug, Clone)]
pub enum Postable {
    Job(Job),
    Project(Project),
}

impl Postable {
    pub fn from_document(kind: PostableKind, document: &Document) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            PostableKind::Job => Postable::Job(serde_json::from_value(document.data.clone())?),
            PostableKind::Project => {
                Postable::Project(serde_json::from_value(document.data.clone())?)
            }
        })
    }

    pub fn id(&self) -> Uuid {
        match self {
            Postable::Job(job) => job.id,
            Postable::Project(project) => project.id,
        }
    }

    pub fn kind(&self) -> PostableKind {
        match self {
            Postable::Job(_) => PostableKind::Job,
            Postable::Project(_) => PostableKind::Project,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Postable::Job(job) => job.location.as_deref(),
            Postable::Project(project) => project.location.as_deref(),
        }
    }

    pub fn embedding(&self) -> &StoredEmbedding {
        match self {
            Postable::Job(job) => &job.embedding,
            Postable::Project(project) => &project.embedding,
        }
    }

    /// Required skills, taken from the first non-empty field in priority order:
    /// jobs use `requirements` then `required_skills`, projects use
    /// `skills_required` then `required_skills`.
    pub fn required_skills(&self) -> &[String] {
        let ordered: [&Vec<String>; 2] = match self {
            Postable::Job(job) => [&job.requirements, &job.required_skills],
            Postable::Project(project) => [&project.skills_required, &project.required_skills],
        };
        ordered
            .into_iter()
            .find(|list| !list.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn searchable_text(&self) -> String {
        match self {
            Postable::Job(job) => compose_job_text(job),
            Postable::Project(project) => compose_project_text(project),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_doc(data: serde_json::Value) -> Document {
        Document::new(Uuid::new_v4(), data)
    }

    #[test]
    fn test_job_prefers_requirements_over_required_skills() {
        let doc = job_doc(json!({
            "requirements": ["Rust"],
            "required_skills": ["Go"],
        }));
        let postable = Postable::from_document(PostableKind::Job, &doc).unwrap();
        assert_eq!(postable.required_skills(), ["Rust".to_string()]);
    }

    #[test]
    fn test_job_falls_back_to_required_skills_when_requirements_empty() {
        let doc = job_doc(json!({"requirements": [], "required_skills": ["Go"]}));
        let postable = Postable::from_document(PostableKind::Job, &doc).unwrap();
        assert_eq!(postable.required_skills(), ["Go".to_string()]);
    }

    #[test]
    fn test_project_reads_skills_required_first() {
        let doc = job_doc(json!({
            "skills_required": ["Kotlin"],
            "required_skills": ["Swift"],
            "tech_stack": ["Android"],
        }));
        let postable = Postable::from_document(PostableKind::Project, &doc).unwrap();
        assert_eq!(postable.required_skills(), ["Kotlin".to_string()]);
        assert_eq!(postable.kind(), PostableKind::Project);
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let doc = job_doc(json!({"requirements": null, "location": "Remote"}));
        let postable = Postable::from_document(PostableKind::Job, &doc).unwrap();
        assert!(postable.required_skills().is_empty());
        assert_eq!(postable.location(), Some("Remote"));
    }

    #[test]
    fn test_malformed_skill_list_fails_to_decode() {
        let doc = job_doc(json!({"requirements": 42}));
        assert!(Postable::from_document(PostableKind::Job, &doc).is_err());
    }

    #[test]
    fn test_owner_id_is_passed_through_untyped() {
        let doc = job_doc(json!({"owner_id": "user-42", "requirements": ["Rust"]}));
        let Postable::Job(job) = Postable::from_document(PostableKind::Job, &doc).unwrap() else {
            panic!("expected a job");
        };
        assert_eq!(job.owner_id, Some(json!("user-42")));

        let doc = job_doc(json!({"owner_id": 1234}));
        assert!(Postable::from_document(PostableKind::Project, &doc).is_ok());
    }

    #[test]
    fn test_recommendation_kind_per_postable_kind() {
        assert_eq!(
            PostableKind::Job.recommendation_kind(),
            RecommendationKind::JobRecommendation
        );
        assert_eq!(PostableKind::Project.collection(), PROJECTS);
    }
}
