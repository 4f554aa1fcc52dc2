pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{handle_revoke, reject_revoked_tokens};
use crate::matching::handlers as matching;
use crate::profiles::handlers as profiles;
use crate::recommendations::handlers as recommendations;
use crate::search::handlers as search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Records
        .route(
            "/api/v1/jobs",
            post(profiles::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(profiles::handle_get_job)
                .patch(profiles::handle_patch_job)
                .delete(profiles::handle_delete_job),
        )
        .route("/api/v1/projects", post(profiles::handle_create_project))
        .route(
            "/api/v1/projects/:id",
            get(profiles::handle_get_project)
                .patch(profiles::handle_patch_project)
                .delete(profiles::handle_delete_project),
        )
        .route(
            "/api/v1/candidates",
            post(profiles::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(profiles::handle_get_candidate)
                .patch(profiles::handle_patch_candidate)
                .delete(profiles::handle_delete_candidate),
        )
        // Matching
        .route(
            "/api/v1/jobs/:id/candidates",
            get(matching::handle_job_candidates),
        )
        .route(
            "/api/v1/projects/:id/candidates",
            get(matching::handle_project_candidates),
        )
        .route(
            "/api/v1/candidates/:id/jobs",
            get(matching::handle_candidate_jobs),
        )
        .route(
            "/api/v1/candidates/:id/projects",
            get(matching::handle_candidate_projects),
        )
        .route("/api/v1/match-score", post(matching::handle_match_score))
        .route(
            "/api/v1/candidates/:id/recommendations",
            get(recommendations::handle_list_recommendations),
        )
        // Search
        .route("/api/v1/search/:collection", post(search::handle_search))
        // Auth
        .route("/api/v1/auth/revoke", post(handle_revoke))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            reject_revoked_tokens,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
