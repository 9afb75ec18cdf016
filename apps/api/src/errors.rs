use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::cv::{CvType, GenerationRecord};
use crate::models::user::SubscriptionType;
use crate::quota::remaining;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Plan limit reached. A policy rejection, raised before any record exists.
    #[error("{limit_type} CV limit of {limit} reached on the {plan} plan")]
    QuotaExceeded {
        plan: SubscriptionType,
        limit_type: CvType,
        limit: i32,
        used: i32,
    },

    /// The AI step failed after the record was created. `record` is the stored
    /// `failed` record and is returned to the client alongside the error.
    #[error("CV generation {} failed: {message}", .record.id)]
    GenerationFailed {
        message: String,
        record: Box<GenerationRecord>,
    },

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = Map::new();
        let mut record_body = None;

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::QuotaExceeded {
                plan,
                limit_type,
                limit,
                used,
            } => {
                details.insert("plan".into(), json!(plan));
                details.insert("limitType".into(), json!(limit_type));
                details.insert("limit".into(), json!(limit));
                details.insert("remaining".into(), json!(remaining(*limit, *used)));
                (StatusCode::FORBIDDEN, "QUOTA_EXCEEDED", self.to_string())
            }
            AppError::GenerationFailed { message, record } => {
                tracing::error!("Generation {} failed: {message}", record.id);
                details.insert("cvId".into(), json!(record.id));
                details.insert("status".into(), json!(record.status));
                record_body = serde_json::to_value(&**record).ok();
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    format!("CV generation failed: {message}"),
                )
            }
            AppError::RenderFailed(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_FAILED",
                    "The CV document could not be rendered".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = Map::new();
        error.insert("code".into(), Value::from(code));
        error.insert("message".into(), Value::from(message));
        error.extend(details);

        let mut body = Map::new();
        body.insert("error".into(), Value::Object(error));
        if let Some(record) = record_body {
            body.insert("record".into(), record);
        }

        (status, Json(Value::Object(body))).into_response()
    }
}
