//! Job, project and candidate records: create, read, patch, delete.
//!
//! Records are stored as schemaless JSON, but every write is decoded into the
//! typed model first so malformed shapes are rejected at the door. Embeddings
//! are generated on create and regenerated whenever a patch touches a field
//! that feeds the searchable text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::models::postable::{Job, Postable, PostableKind, Project};
use crate::models::StoredEmbedding;
use crate::search::strip_fields;
use crate::store::{
    merge_patch, Document, DocumentStore, Filter, CANDIDATES, JOBS, PROJECTS, RECOMMENDATIONS,
};

pub mod handlers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Job,
    Project,
    Candidate,
}

impl ProfileKind {
    pub fn collection(self) -> &'static str {
        match self {
            ProfileKind::Job => JOBS,
            ProfileKind::Project => PROJECTS,
            ProfileKind::Candidate => CANDIDATES,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileKind::Job => "job",
            ProfileKind::Project => "project",
            ProfileKind::Candidate => "candidate",
        }
    }

    fn text_fields(self) -> &'static [&'static str] {
        match self {
            ProfileKind::Job => Job::TEXT_FIELDS,
            ProfileKind::Project => Project::TEXT_FIELDS,
            ProfileKind::Candidate => Candidate::TEXT_FIELDS,
        }
    }

    /// Recommendation field that points at a record of this kind.
    fn recommendation_field(self) -> &'static str {
        match self {
            ProfileKind::Candidate => "subject_id",
            ProfileKind::Job | ProfileKind::Project => "object_id",
        }
    }

    /// Decodes the record into its typed model and composes its searchable text.
    fn searchable_text(self, document: &Document) -> Result<String, serde_json::Error> {
        Ok(match self {
            ProfileKind::Job => {
                Postable::from_document(PostableKind::Job, document)?.searchable_text()
            }
            ProfileKind::Project => {
                Postable::from_document(PostableKind::Project, document)?.searchable_text()
            }
            ProfileKind::Candidate => Candidate::from_document(document)?.searchable_text(),
        })
    }
}

/// Record with derived fields removed, as returned to clients.
pub fn public_view(data: Value) -> Value {
    strip_fields(data, StoredEmbedding::FIELDS)
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    pub async fn create(&self, kind: ProfileKind, body: Value) -> Result<Value, AppError> {
        let fields = writable_fields(body)?;
        let id = Uuid::new_v4();
        let mut document = Document::new(id, Value::Object(fields));

        let text = kind
            .searchable_text(&document)
            .map_err(|e| AppError::UnprocessableEntity(format!("invalid {}: {e}", kind.label())))?;

        let embedding = self.embed(kind, id, &text).await;
        if embedding.embedding.is_some() {
            merge_patch(&mut document.data, &embedding.to_patch());
        }

        self.store.insert(kind.collection(), &document).await?;
        info!(%id, kind = kind.label(), embedded = embedding.embedding.is_some(), "Created record");

        Ok(public_view(document.data))
    }

    pub async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Value, AppError> {
        let document = self.find(kind, id).await?;
        Ok(public_view(document.data))
    }

    /// Shallow-merges `body` into the record. `id` and embedding fields in the
    /// body are ignored.
    pub async fn patch(&self, kind: ProfileKind, id: Uuid, body: Value) -> Result<Value, AppError> {
        let mut patch = writable_fields(body)?;
        let existing = self.find(kind, id).await?;

        let mut merged = existing.data;
        merge_patch(&mut merged, &Value::Object(patch.clone()));
        let merged = Document::new(id, merged);

        let text = kind
            .searchable_text(&merged)
            .map_err(|e| AppError::UnprocessableEntity(format!("invalid {}: {e}", kind.label())))?;

        let touches_text = patch
            .keys()
            .any(|field| kind.text_fields().contains(&field.as_str()));
        if touches_text {
            // A provider outage clears the stale vector rather than keeping it.
            let embedding = self.embed(kind, id, &text).await;
            if let Value::Object(fields) = embedding.to_patch() {
                patch.extend(fields);
            }
        }

        let patch = Value::Object(patch);
        if !self
            .store
            .update_one(kind.collection(), &Filter::by_id(id), &patch)
            .await?
        {
            return Err(AppError::NotFound(format!("{} {id}", kind.label())));
        }

        let mut data = merged.data;
        merge_patch(&mut data, &patch);
        info!(%id, kind = kind.label(), reembedded = touches_text, "Updated record");
        Ok(public_view(data))
    }

    /// Deletes the record and every recommendation that references it.
    pub async fn delete(&self, kind: ProfileKind, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .store
            .delete(kind.collection(), &Filter::by_id(id))
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!("{} {id}", kind.label())));
        }

        let cascade = Filter::new().eq(kind.recommendation_field(), id.to_string());
        let recommendations = self.store.delete(RECOMMENDATIONS, &cascade).await?;
        info!(%id, kind = kind.label(), recommendations, "Deleted record");
        Ok(())
    }

    async fn find(&self, kind: ProfileKind, id: Uuid) -> Result<Document, AppError> {
        self.store
            .find_one(kind.collection(), &Filter::by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {id}", kind.label())))
    }

    async fn embed(&self, kind: ProfileKind, id: Uuid, text: &str) -> StoredEmbedding {
        if text.is_empty() {
            return StoredEmbedding::default();
        }
        let vector = self.embeddings.embed(text).await;
        if vector.is_empty() {
            warn!(%id, kind = kind.label(), "Embedding unavailable; record stored without one");
        }
        StoredEmbedding::generated(vector, self.embeddings.model())
    }
}

/// Client-supplied fields, minus the ones the service owns.
fn writable_fields(body: Value) -> Result<Map<String, Value>, AppError> {
    let Value::Object(mut fields) = body else {
        return Err(AppError::Validation(
            "request body must be a JSON object".to_string(),
        ));
    };
    fields.remove("id");
    for field in StoredEmbedding::FIELDS {
        fields.remove(*field);
    }
    Ok(fields)
}
