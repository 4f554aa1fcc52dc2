//! Text composer: one deterministic searchable string per entity.
//!
//! Fields are appended in a fixed order per entity kind. Scalars go in
//! verbatim, lists are space-joined, nested structures contribute their known
//! sub-keys. Absent or blank values are skipped without placeholders.

use crate::models::candidate::{Candidate, Education, Experience};
use crate::models::postable::{Job, Project};

#[derive(Default)]
struct TextBuilder {
    parts: Vec<String>,
}

impl TextBuilder {
    fn scalar(&mut self, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.parts.push(v.to_string());
        }
        self
    }

    fn list<'a, I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = items
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            self.parts.push(joined);
        }
        self
    }

    fn finish(&mut self) -> String {
        std::mem::take(&mut self.parts).join(" ")
    }
}

fn strs(list: &[String]) -> impl Iterator<Item = &str> {
    list.iter().map(String::as_str)
}

pub fn compose_job_text(job: &Job) -> String {
    TextBuilder::default()
        .scalar(job.title.as_deref())
        .scalar(job.company.as_deref())
        .scalar(job.description.as_deref())
        .list(strs(&job.requirements))
        .list(strs(&job.required_skills))
        .list(strs(&job.nice_to_have))
        .scalar(job.location.as_deref())
        .scalar(job.employment_type.as_deref())
        .finish()
}

pub fn compose_project_text(project: &Project) -> String {
    TextBuilder::default()
        .scalar(project.title.as_deref())
        .scalar(project.company.as_deref())
        .scalar(project.description.as_deref())
        .list(strs(&project.skills_required))
        .list(strs(&project.required_skills))
        .list(strs(&project.tech_stack))
        .scalar(project.location.as_deref())
        .scalar(project.duration.as_deref())
        .finish()
}

pub fn compose_candidate_text(candidate: &Candidate) -> String {
    let mut text = TextBuilder::default();
    text.scalar(candidate.headline.as_deref())
        .scalar(candidate.summary.as_deref())
        .list(candidate.skills.flatten());

    match &candidate.experience {
        Some(Experience::Summary(summary)) => {
            text.scalar(Some(summary.as_str()));
        }
        Some(experience) => {
            for position in experience.positions() {
                text.scalar(position.title.as_deref())
                    .scalar(position.company.as_deref())
                    .scalar(position.description.as_deref());
            }
        }
        None => {}
    }

    match &candidate.education {
        Some(Education::Summary(summary)) => {
            text.scalar(Some(summary.as_str()));
        }
        Some(education) => {
            for entry in education.entries() {
                text.scalar(entry.degree.as_deref())
                    .scalar(entry.field.as_deref())
                    .scalar(entry.institution.as_deref());
            }
        }
        None => {}
    }

    text.scalar(candidate.location.as_deref()).finish()
}
