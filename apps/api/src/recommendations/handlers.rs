use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::recommendation::Recommendation;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RecommendationListResponse {
    pub candidate_id: Uuid,
    pub recommendations: Vec<Recommendation>,
}

/// GET /api/v1/candidates/:id/recommendations
pub async fn handle_list_recommendations(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<RecommendationListResponse>, AppError> {
    let recommendations = state
        .recommendations()
        .list_for_subject(candidate_id)
        .await?;

    Ok(Json(RecommendationListResponse {
        candidate_id,
        recommendations,
    }))
}
