use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::GenerationRecord;
use crate::render::templates::{TemplateInfo, TEMPLATES};
use crate::render::PDF_CONTENT_TYPE;
use crate::state::{AppState, UserIdQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub user_id: Uuid,
    /// Renders with this template instead of the one stored on the record.
    pub template_name: Option<String>,
}

/// POST /api/v1/cvs/:id/render
pub async fn handle_render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<GenerationRecord>, AppError> {
    let template = req
        .template_name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let record = state.renders.render_cv(req.user_id, id, template).await?;
    Ok(Json(record))
}

/// GET /api/v1/cvs/:id/pdf?userId=
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pdf = state.renders.download(params.user_id, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"cv-{id}.pdf\""),
            ),
        ],
        pdf,
    ))
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<&'static [TemplateInfo]> {
    Json(TEMPLATES)
}
