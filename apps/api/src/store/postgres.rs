use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, Filter, StoreError};

/// `DocumentStore` over a single JSONB `documents` table.
/// Filters are matched with JSONB containment (`data @> filter`).
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            data: row.data,
        }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Mirrors `data.embedding` into the `vector` column. Empty or non-numeric
/// embeddings leave the column NULL so they never reach the vector index.
pub(crate) fn embedding_column(data: &Value) -> Option<Vector> {
    let values = data.get("embedding")?.as_array()?;
    if values.is_empty() {
        return None;
    }
    let floats: Option<Vec<f32>> = values.iter().map(|v| v.as_f64().map(|f| f as f32)).collect();
    floats.map(Vector::from)
}

fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(collection.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY seq
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(filter.as_value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND data @> $2 ORDER BY seq",
        )
        .bind(collection)
        .bind(filter.as_value())
        .fetch_all(&self.pool)
        .await?;

        debug!("find_many({collection}) returned {} records", rows.len());
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data, embedding) VALUES ($1, $2, $3, $4)",
        )
        .bind(collection)
        .bind(document.id)
        .bind(&document.data)
        .bind(embedding_column(&document.data))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Value,
    ) -> Result<bool, StoreError> {
        let touches_embedding = patch.get("embedding").is_some();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3,
                embedding = CASE WHEN $4 THEN $5 ELSE embedding END
            WHERE collection = $1
              AND id = (
                  SELECT id FROM documents
                  WHERE collection = $1 AND data @> $2
                  ORDER BY seq
                  LIMIT 1
              )
            "#,
        )
        .bind(collection)
        .bind(filter.as_value())
        .bind(patch)
        .bind(touches_embedding)
        .bind(embedding_column(patch))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND data @> $2")
            .bind(collection)
            .bind(filter.as_value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn filtered_scan(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY seq
            LIMIT $3
            "#,
        )
        .bind(collection)
        .bind(filter.as_value())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }
}
