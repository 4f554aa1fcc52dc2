//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::orchestrator::{MatchMethod, RankedMatch};
use crate::models::candidate::Candidate;
use crate::models::postable::{Postable, PostableKind};
use crate::recommendations::{PersistSummary, RecommendationPair, UpsertResult};
use crate::state::AppState;
use crate::store::{Filter, CANDIDATES};

/// Upper bound on `?limit=` for ranked listings.
pub const MAX_MATCH_LIMIT: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    /// The record everything was ranked against.
    pub id: Uuid,
    pub total: usize,
    pub matches: Vec<RankedMatch>,
    pub recommendations: PersistSummary,
}

#[derive(Debug, Deserialize)]
pub struct MatchScoreRequest {
    pub candidate_id: Uuid,
    pub job_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MatchScoreResponse {
    pub candidate_id: Uuid,
    pub object_id: Uuid,
    pub kind: PostableKind,
    pub score: f64,
    pub explanation: String,
    pub method: MatchMethod,
    /// Id of the stored recommendation when the score cleared the threshold.
    pub recommendation_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs/:id/candidates
pub async fn handle_job_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    rank_candidates_for(&state, PostableKind::Job, job_id, &query).await
}

/// GET /api/v1/projects/:id/candidates
pub async fn handle_project_candidates(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    rank_candidates_for(&state, PostableKind::Project, project_id, &query).await
}

/// GET /api/v1/candidates/:id/jobs
pub async fn handle_candidate_jobs(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    rank_postables_for(&state, candidate_id, PostableKind::Job, &query).await
}

/// GET /api/v1/candidates/:id/projects
pub async fn handle_candidate_projects(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    rank_postables_for(&state, candidate_id, PostableKind::Project, &query).await
}

/// POST /api/v1/match-score
///
/// Scores one candidate against exactly one job or project. A score at or
/// above the recommendation threshold is upserted; storage failures there do
/// not fail the request.
pub async fn handle_match_score(
    State(state): State<AppState>,
    Json(request): Json<MatchScoreRequest>,
) -> Result<Json<MatchScoreResponse>, AppError> {
    let (kind, object_id) = match (request.job_id, request.project_id) {
        (Some(job_id), None) => (PostableKind::Job, job_id),
        (None, Some(project_id)) => (PostableKind::Project, project_id),
        _ => {
            return Err(AppError::Validation(
                "exactly one of job_id or project_id is required".to_string(),
            ))
        }
    };

    let postable = load_postable(&state, kind, object_id).await?;
    let candidate = load_candidate(&state, request.candidate_id).await?;

    let outcome = state.orchestrator().score(&postable, &candidate).await;

    let recommendation_id = match state
        .recommendations()
        .upsert_one(
            candidate.id,
            object_id,
            kind.recommendation_kind(),
            outcome.score(),
        )
        .await
    {
        Ok(UpsertResult::Inserted(id))
        | Ok(UpsertResult::Updated(id))
        | Ok(UpsertResult::Unchanged(id)) => Some(id),
        Ok(UpsertResult::BelowThreshold) => None,
        Err(e) => {
            warn!(candidate_id = %candidate.id, %object_id, "Recommendation upsert failed: {e}");
            None
        }
    };

    Ok(Json(MatchScoreResponse {
        candidate_id: candidate.id,
        object_id,
        kind,
        score: outcome.score(),
        explanation: outcome.explanation(),
        method: outcome.method(),
        recommendation_id,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared flow
// ────────────────────────────────────────────────────────────────────────────

async fn rank_candidates_for(
    state: &AppState,
    kind: PostableKind,
    postable_id: Uuid,
    query: &LimitQuery,
) -> Result<Json<MatchListResponse>, AppError> {
    let limit = resolve_limit(query, state.config.default_match_limit)?;
    let postable = load_postable(state, kind, postable_id).await?;

    let candidates = state.store.find_many(CANDIDATES, &Filter::new()).await?;
    let mut ranked = state
        .orchestrator()
        .rank_candidates(&postable, &candidates)
        .await;

    let recommendations = state
        .recommendations()
        .persist(
            kind.recommendation_kind(),
            &RecommendationPair::for_postable(postable_id, &ranked),
        )
        .await;

    info!(
        postable_id = %postable_id,
        kind = kind.label(),
        total = ranked.len(),
        "Ranked candidates"
    );

    let total = ranked.len();
    ranked.truncate(limit);
    Ok(Json(MatchListResponse {
        id: postable_id,
        total,
        matches: ranked,
        recommendations,
    }))
}

async fn rank_postables_for(
    state: &AppState,
    candidate_id: Uuid,
    kind: PostableKind,
    query: &LimitQuery,
) -> Result<Json<MatchListResponse>, AppError> {
    let limit = resolve_limit(query, state.config.default_match_limit)?;
    let candidate = load_candidate(state, candidate_id).await?;

    let postables = state
        .store
        .find_many(kind.collection(), &Filter::new())
        .await?;
    let mut ranked = state
        .orchestrator()
        .rank_postables(&candidate, kind, &postables)
        .await;

    let recommendations = state
        .recommendations()
        .persist(
            kind.recommendation_kind(),
            &RecommendationPair::for_candidate(candidate_id, &ranked),
        )
        .await;

    info!(
        candidate_id = %candidate_id,
        kind = kind.label(),
        total = ranked.len(),
        "Ranked postables"
    );

    let total = ranked.len();
    ranked.truncate(limit);
    Ok(Json(MatchListResponse {
        id: candidate_id,
        total,
        matches: ranked,
        recommendations,
    }))
}

fn resolve_limit(query: &LimitQuery, default: usize) -> Result<usize, AppError> {
    match query.limit {
        Some(0) => Err(AppError::Validation("limit must be at least 1".to_string())),
        Some(limit) => Ok(limit.min(MAX_MATCH_LIMIT)),
        None => Ok(default.clamp(1, MAX_MATCH_LIMIT)),
    }
}

pub(crate) async fn load_postable(
    state: &AppState,
    kind: PostableKind,
    id: Uuid,
) -> Result<Postable, AppError> {
    let document = state
        .store
        .find_one(kind.collection(), &Filter::by_id(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", kind.label())))?;

    Postable::from_document(kind, &document).map_err(|e| {
        AppError::UnprocessableEntity(format!("{} {id} is malformed: {e}", kind.label()))
    })
}

pub(crate) async fn load_candidate(state: &AppState, id: Uuid) -> Result<Candidate, AppError> {
    let document = state
        .store
        .find_one(CANDIDATES, &Filter::by_id(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("candidate {id}")))?;

    Candidate::from_document(&document)
        .map_err(|e| AppError::UnprocessableEntity(format!("candidate {id} is malformed: {e}")))
}
