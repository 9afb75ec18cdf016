pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::generation::handlers as cvs;
use crate::quota::handlers as subscription;
use crate::render::handlers as render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CV generation
        .route("/api/v1/cvs/generate", post(cvs::handle_generate))
        .route("/api/v1/cvs", get(cvs::handle_list))
        .route(
            "/api/v1/cvs/:id",
            get(cvs::handle_get).delete(cvs::handle_delete),
        )
        .route("/api/v1/cvs/:id/summary", patch(cvs::handle_update_summary))
        .route(
            "/api/v1/job-postings/:id/analyze",
            post(cvs::handle_analyze_job),
        )
        // Rendering
        .route("/api/v1/cvs/:id/render", post(render::handle_render))
        .route("/api/v1/cvs/:id/pdf", get(render::handle_download_pdf))
        .route("/api/v1/templates", get(render::handle_list_templates))
        // Subscription & quota
        .route("/api/v1/subscription", get(subscription::handle_get_status))
        .route(
            "/api/v1/subscription/upgrade",
            post(subscription::handle_upgrade),
        )
        .route(
            "/api/v1/subscription/downgrade",
            post(subscription::handle_downgrade),
        )
        .with_state(state)
}
