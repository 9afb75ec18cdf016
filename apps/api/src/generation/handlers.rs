//! Axum route handlers for the CV Generation API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::analysis::JobAnalysis;
use crate::generation::orchestrator::GenerateCvRequest;
use crate::models::cv::{CvStatus, GenerationRecord};
use crate::profiles::{require_job_posting, require_profile};
use crate::state::{AppState, UserIdQuery};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummaryRequest {
    pub user_id: Uuid,
    pub professional_summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeJobRequest {
    pub user_id: Uuid,
    /// Adds a match assessment against this profile.
    pub profile_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cvs/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateCvRequest>,
) -> Result<(StatusCode, Json<GenerationRecord>), AppError> {
    let record = state.orchestrator.generate(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/cvs?userId=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<GenerationRecord>>, AppError> {
    Ok(Json(state.generations.list(params.user_id).await?))
}

/// GET /api/v1/cvs/:id?userId=
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GenerationRecord>, AppError> {
    let record = state
        .generations
        .find(params.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;
    Ok(Json(record))
}

/// PATCH /api/v1/cvs/:id/summary
pub async fn handle_update_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSummaryRequest>,
) -> Result<Json<GenerationRecord>, AppError> {
    let summary = req.professional_summary.trim();
    if summary.is_empty() {
        return Err(AppError::Validation(
            "professionalSummary must not be empty".to_string(),
        ));
    }

    let existing = state
        .generations
        .find(req.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;
    if existing.status != CvStatus::Completed {
        return Err(AppError::Conflict(format!(
            "CV {id} is {} and has no summary to edit",
            existing.status.as_str()
        )));
    }

    let updated = state
        .generations
        .update_summary(req.user_id, id, summary)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/cvs/:id?userId=
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .generations
        .delete(params.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;

    state.renders.discard_artifact(&deleted).await;
    info!("Deleted CV {id} of user {}", params.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/job-postings/:id/analyze
///
/// Advisory. An unavailable AI service yields an empty analysis, not an error.
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    Path(job_posting_id): Path<Uuid>,
    Json(req): Json<AnalyzeJobRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    let job = require_job_posting(state.profiles.as_ref(), req.user_id, job_posting_id).await?;
    let profile = match req.profile_id {
        Some(id) => Some(require_profile(state.profiles.as_ref(), req.user_id, id).await?),
        None => None,
    };

    let analysis = state.generator.analyze_job(&job, profile.as_ref()).await;
    Ok(Json(analysis))
}
