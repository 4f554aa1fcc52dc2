//! Document store: the persistence collaborator behind every endpoint.
//!
//! Records are schemaless JSON objects grouped into named collections. The
//! matching core only reads and writes the fields it owns; everything else is
//! pass-through data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub const JOBS: &str = "jobs";
pub const PROJECTS: &str = "projects";
pub const CANDIDATES: &str = "candidates";
pub const RECOMMENDATIONS: &str = "recommendations";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate key in collection '{0}'")]
    Conflict(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored record. `data["id"]` always mirrors `id` so filters can match on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
}

impl Document {
    pub fn new(id: Uuid, mut data: Value) -> Self {
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }
        Self { id, data }
    }

    /// Builds a document from any serializable record carrying its own id.
    pub fn from_record<T: Serialize>(id: Uuid, record: &T) -> Result<Self, StoreError> {
        Ok(Self::new(id, serde_json::to_value(record)?))
    }
}

/// Field-equality filter. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("id", id.to_string())
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Accepts a client-supplied JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(StoreError::InvalidFilter(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Top-level equality match, the same semantics the Postgres store gets
    /// from JSONB containment for scalar fields.
    pub fn matches(&self, data: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| data.get(field) == Some(expected))
    }
}

/// Persistence contract consumed by the matching core and the handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: &Filter)
        -> Result<Option<Document>, StoreError>;

    async fn find_many(&self, collection: &str, filter: &Filter)
        -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, collection: &str, document: &Document) -> Result<(), StoreError>;

    /// Shallow-merges `patch` into the first matching record.
    /// Returns whether a record was updated.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Value,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// First `limit` matching records in stored order.
    async fn filtered_scan(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;
}

/// Applies a shallow merge patch, the in-process counterpart of `data || patch`.
pub fn merge_patch(data: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(fields)) = (data, patch) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}
