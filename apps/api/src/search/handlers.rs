use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::search::{search_with_fallback, SearchOutcome};
use crate::state::AppState;
use crate::store::{Filter, CANDIDATES, JOBS, PROJECTS};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
    /// Equality filter on top-level record fields.
    pub filter: Option<Value>,
}

/// POST /api/v1/search/:collection
///
/// Embeds `query` and returns the nearest records of `collection`. Falls back
/// to a filtered scan when vector search is unavailable.
pub async fn handle_search(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    let collection = match collection.as_str() {
        JOBS => JOBS,
        PROJECTS => PROJECTS,
        CANDIDATES => CANDIDATES,
        other => {
            return Err(AppError::NotFound(format!("collection '{other}'")));
        }
    };

    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let limit = request
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let filter = match request.filter {
        Some(value) => {
            Filter::from_value(value).map_err(|e| AppError::Validation(e.to_string()))?
        }
        None => Filter::new(),
    };

    let vector = state.embeddings.embed(query).await;
    let outcome = search_with_fallback(
        state.search.as_ref(),
        state.store.as_ref(),
        collection,
        &vector,
        limit,
        &filter,
    )
    .await;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::embedding::testing::StaticEmbeddings;
    use crate::search::SearchMethod;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::Document;
    use serde_json::json;
    use uuid::Uuid;

    fn request(query: &str, filter: Option<Value>) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            limit: None,
            filter,
        }
    }

    #[tokio::test]
    async fn test_search_falls_back_and_applies_filter() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed(JOBS, Document::new(Uuid::new_v4(), json!({"title": "Rust", "location": "Remote"})));
        store.seed(JOBS, Document::new(Uuid::new_v4(), json!({"title": "Go", "location": "Berlin"})));
        let state = AppState::for_tests(store, Arc::new(StaticEmbeddings::always(vec![1.0, 0.0])));

        let Json(outcome) = handle_search(
            State(state),
            Path("jobs".to_string()),
            Json(request("rust backend", Some(json!({"location": "Remote"})))),
        )
        .await
        .unwrap();

        assert_eq!(outcome.method, SearchMethod::FilteredScan);
        assert_eq!(outcome.results, vec![json!({"title": "Rust", "location": "Remote"})]);
    }

    #[tokio::test]
    async fn test_unknown_collection_rejected() {
        let state = AppState::for_tests(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(StaticEmbeddings::unavailable()),
        );
        let result = handle_search(
            State(state),
            Path("recommendations".to_string()),
            Json(request("anything", None)),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_object_filter_rejected() {
        let state = AppState::for_tests(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(StaticEmbeddings::unavailable()),
        );
        let result = handle_search(
            State(state),
            Path("candidates".to_string()),
            Json(request("anything", Some(json!(["location"])))),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let state = AppState::for_tests(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(StaticEmbeddings::unavailable()),
        );
        let result =
            handle_search(State(state), Path("jobs".to_string()), Json(request("   ", None))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
