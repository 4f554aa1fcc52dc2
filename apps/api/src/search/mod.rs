//! Vector search gateway: nearest-neighbour lookup delegated to the database.
//!
//! When the gateway errors (or there is no query vector to search with) the
//! request degrades to a filtered scan of the same collection in stored order.

use async_trait::async_trait;
use pgvector::Vector;
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::StoredEmbedding;
use crate::store::{DocumentStore, Filter};

pub mod handlers;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No query vector available")]
    EmptyQuery,
}

/// One nearest-neighbour result. `record` has its embedding fields removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub relevance: f64,
    pub record: Value,
}

#[async_trait]
pub trait VectorSearchGateway: Send + Sync {
    async fn vector_search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        filter: &Filter,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Vector,
    FilteredScan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub method: SearchMethod,
    pub results: Vec<Value>,
}

/// Removes `fields` from a JSON object; other values pass through untouched.
pub fn strip_fields(mut record: Value, fields: &[&str]) -> Value {
    if let Value::Object(map) = &mut record {
        for field in fields {
            map.remove(*field);
        }
    }
    record
}

/// Runs the vector search, falling back to a filtered scan on any failure.
/// Never fails: if the scan fails as well the result list is empty.
pub async fn search_with_fallback(
    gateway: &dyn VectorSearchGateway,
    store: &dyn DocumentStore,
    collection: &str,
    query: &[f32],
    limit: usize,
    filter: &Filter,
) -> SearchOutcome {
    let attempt = if query.is_empty() {
        Err(SearchError::EmptyQuery)
    } else {
        gateway.vector_search(collection, query, limit, filter).await
    };

    match attempt {
        Ok(hits) => {
            info!("Vector search on {collection} returned {} hits", hits.len());
            let results = hits
                .into_iter()
                .map(|hit| {
                    let mut record = strip_fields(hit.record, StoredEmbedding::FIELDS);
                    if let Value::Object(map) = &mut record {
                        map.insert("id".to_string(), Value::String(hit.id.to_string()));
                        map.insert("relevance".to_string(), Value::from(hit.relevance));
                    }
                    record
                })
                .collect();
            SearchOutcome {
                method: SearchMethod::Vector,
                results,
            }
        }
        Err(e) => {
            warn!("Vector search on {collection} unavailable, using filtered scan: {e}");
            let results = match store.filtered_scan(collection, filter, limit).await {
                Ok(documents) => documents
                    .into_iter()
                    .map(|doc| {
                        let record = strip_fields(doc.data, &["id"]);
                        strip_fields(record, StoredEmbedding::FIELDS)
                    })
                    .collect(),
                Err(e) => {
                    error!("Filtered scan on {collection} failed: {e}");
                    Vec::new()
                }
            };
            SearchOutcome {
                method: SearchMethod::FilteredScan,
                results,
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// pgvector gateway
// ────────────────────────────────────────────────────────────────────────────

/// Cosine-distance search over the `documents.embedding` column.
///
/// Only rows embedded by `model` at the query's dimension are compared;
/// vectors left over from another model are skipped until re-embedded.
#[derive(Clone)]
pub struct PgVectorSearch {
    pool: PgPool,
    model: String,
}

#[derive(Debug, FromRow)]
struct HitRow {
    id: Uuid,
    data: Value,
    relevance: f64,
}

impl PgVectorSearch {
    pub fn new(pool: PgPool, model: String) -> Self {
        Self { pool, model }
    }
}

/// Whether a stored record's embedding is comparable with a query vector of
/// `dim` dimensions produced by `model`.
fn comparable_embedding(data: &Value, model: &str, dim: usize) -> bool {
    serde_json::from_value::<StoredEmbedding>(data.clone())
        .ok()
        .and_then(|stored| stored.usable_for(model).map(|vector| vector.len() == dim))
        .unwrap_or(false)
}

#[async_trait]
impl VectorSearchGateway for PgVectorSearch {
    async fn vector_search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        filter: &Filter,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let rows = sqlx::query_as::<_, HitRow>(
            r#"
            SELECT id, data, (1 - (embedding <=> $3))::float8 AS relevance
            FROM documents
            WHERE collection = $1
              AND data @> $2
              AND embedding IS NOT NULL
              AND data->>'embedding_model' = $5
              AND vector_dims(embedding) = $6
            ORDER BY embedding <=> $3
            LIMIT $4
            "#,
        )
        .bind(collection)
        .bind(filter.as_value())
        .bind(Vector::from(query.to_vec()))
        .bind(limit as i64)
        .bind(self.model.as_str())
        .bind(query.len() as i32)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter(|row| comparable_embedding(&row.data, &self.model, query.len()))
            .map(|row| SearchHit {
                id: row.id,
                relevance: row.relevance,
                record: strip_fields(row.data, StoredEmbedding::FIELDS),
            })
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FailingGateway;
    use super::*;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::Document;
    use serde_json::json;

    struct FixedGateway(Vec<SearchHit>);

    #[async_trait]
    impl VectorSearchGateway for FixedGateway {
        async fn vector_search(
            &self,
            _collection: &str,
            _query: &[f32],
            limit: usize,
            _filter: &Filter,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    fn seeded_store() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (title, location) in [("A", "Remote"), ("B", "Berlin"), ("C", "Remote"), ("D", "Remote")] {
            store.seed(
                "jobs",
                Document::new(
                    Uuid::new_v4(),
                    json!({"title": title, "location": location, "embedding": [1.0, 0.0]}),
                ),
            );
        }
        store
    }

    #[tokio::test]
    async fn test_gateway_failure_falls_back_to_filtered_scan() {
        let store = seeded_store();
        let filter = Filter::new().eq("location", "Remote");

        let outcome =
            search_with_fallback(&FailingGateway, &store, "jobs", &[1.0, 0.0], 2, &filter).await;

        assert_eq!(outcome.method, SearchMethod::FilteredScan);
        assert_eq!(
            outcome.results,
            vec![
                json!({"title": "A", "location": "Remote"}),
                json!({"title": "C", "location": "Remote"}),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_query_vector_skips_gateway() {
        let store = seeded_store();
        let gateway = FixedGateway(vec![SearchHit {
            id: Uuid::new_v4(),
            relevance: 0.9,
            record: json!({"title": "never"}),
        }]);

        let outcome = search_with_fallback(&gateway, &store, "jobs", &[], 10, &Filter::new()).await;

        assert_eq!(outcome.method, SearchMethod::FilteredScan);
        assert_eq!(outcome.results.len(), 4);
    }

    #[tokio::test]
    async fn test_vector_hits_carry_id_and_relevance_without_embedding() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        let gateway = FixedGateway(vec![SearchHit {
            id,
            relevance: 0.87,
            record: json!({"title": "Rust", "embedding": [0.1], "embedding_model": "m"}),
        }]);

        let outcome =
            search_with_fallback(&gateway, &store, "jobs", &[0.1], 5, &Filter::new()).await;

        assert_eq!(outcome.method, SearchMethod::Vector);
        assert_eq!(
            outcome.results,
            vec![json!({"title": "Rust", "id": id.to_string(), "relevance": 0.87})]
        );
    }

    #[test]
    fn test_comparable_embedding_requires_model_and_dimension() {
        let current = json!({"embedding": [0.1, 0.2], "embedding_model": "m", "embedding_dim": 2});
        assert!(comparable_embedding(&current, "m", 2));
        assert!(!comparable_embedding(&current, "m", 3));
        assert!(!comparable_embedding(&current, "other-model", 2));

        let untagged = json!({"embedding": [0.1, 0.2]});
        assert!(!comparable_embedding(&untagged, "m", 2));

        let mislabelled = json!({"embedding": [0.1], "embedding_model": "m", "embedding_dim": 2});
        assert!(!comparable_embedding(&mislabelled, "m", 1));
    }

    #[test]
    fn test_strip_fields_ignores_non_objects() {
        assert_eq!(strip_fields(json!([1, 2]), &["id"]), json!([1, 2]));
        assert_eq!(
            strip_fields(json!({"id": 1, "keep": true}), &["id", "missing"]),
            json!({"keep": true})
        );
    }
}
