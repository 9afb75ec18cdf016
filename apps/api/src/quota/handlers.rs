use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::quota::QuotaStatus;
use crate::state::{AppState, UserIdQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub user_id: Uuid,
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeRequest {
    pub user_id: Uuid,
}

/// GET /api/v1/subscription
pub async fn handle_get_status(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<QuotaStatus>, AppError> {
    Ok(Json(state.quota.status(params.user_id).await?))
}

/// POST /api/v1/subscription/upgrade
///
/// Stub: no payment is taken. Grants PRO for `months` (default 1).
pub async fn handle_upgrade(
    State(state): State<AppState>,
    Json(req): Json<UpgradeRequest>,
) -> Result<Json<QuotaStatus>, AppError> {
    let status = state
        .quota
        .upgrade(req.user_id, req.months.unwrap_or(1))
        .await?;
    Ok(Json(status))
}

/// POST /api/v1/subscription/downgrade
pub async fn handle_downgrade(
    State(state): State<AppState>,
    Json(req): Json<DowngradeRequest>,
) -> Result<Json<QuotaStatus>, AppError> {
    Ok(Json(state.quota.downgrade(req.user_id).await?))
}
