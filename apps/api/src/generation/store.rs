//! Persistence for generation records.
//!
//! Status transitions are guarded in SQL (`WHERE status = 'pending'`), so a record
//! moves to a terminal state exactly once and content is written in the same
//! statement that marks it `completed`.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::content::GeneratedCvContent;
use crate::models::cv::{CvGenerationRow, GenerationRecord, NewGeneration};

#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn create_pending(&self, new: NewGeneration) -> Result<GenerationRecord, AppError>;

    /// `pending` → `completed`, storing content and its summary together.
    async fn mark_completed(
        &self,
        id: Uuid,
        content: &GeneratedCvContent,
    ) -> Result<GenerationRecord, AppError>;

    /// `pending` → `failed`. Content stays null.
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError>;

    /// Owner-scoped lookup.
    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError>;

    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<GenerationRecord>, AppError>;

    /// Replaces the professional summary of a completed record, in the column and the content.
    async fn update_summary(
        &self,
        user_id: Uuid,
        id: Uuid,
        summary: &str,
    ) -> Result<Option<GenerationRecord>, AppError>;

    /// Overwrites the rendered artifact location.
    async fn set_pdf(
        &self,
        id: Uuid,
        storage_path: &str,
        url: &str,
    ) -> Result<GenerationRecord, AppError>;

    /// Returns the deleted record, if it existed and was owned by `user_id`.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError>;
}

const RECORD_COLUMNS: &str = "id, user_id, profile_id, job_posting_id, status, cv_type, tone, \
    template_name, content_language, include_profile_picture, cv_specific_photo_url, \
    generated_content, professional_summary, error_message, pdf_url, pdf_storage_path, \
    created_at, updated_at";

pub struct PgGenerationStore {
    pool: PgPool,
}

impl PgGenerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn create_pending(&self, new: NewGeneration) -> Result<GenerationRecord, AppError> {
        let cv_type = new.cv_type();
        let row = sqlx::query_as::<_, CvGenerationRow>(&format!(
            r#"
            INSERT INTO cv_generations
                (id, user_id, profile_id, job_posting_id, status, cv_type, tone, template_name,
                 content_language, include_profile_picture, cv_specific_photo_url)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9, $10)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.profile_id)
        .bind(new.job_posting_id)
        .bind(cv_type.as_str())
        .bind(&new.style.tone)
        .bind(&new.style.template_name)
        .bind(&new.style.content_language)
        .bind(new.style.include_profile_picture)
        .bind(&new.style.cv_specific_photo_url)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        content: &GeneratedCvContent,
    ) -> Result<GenerationRecord, AppError> {
        let row = sqlx::query_as::<_, CvGenerationRow>(&format!(
            r#"
            UPDATE cv_generations
            SET status = 'completed',
                generated_content = $2,
                professional_summary = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(content))
        .bind(&content.professional_summary)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("CV generation {id} is no longer pending")))?;

        row.try_into()
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE cv_generations
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError> {
        sqlx::query_as::<_, CvGenerationRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM cv_generations WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(GenerationRecord::try_from)
        .transpose()
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<GenerationRecord>, AppError> {
        sqlx::query_as::<_, CvGenerationRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM cv_generations WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(GenerationRecord::try_from)
        .collect()
    }

    async fn update_summary(
        &self,
        user_id: Uuid,
        id: Uuid,
        summary: &str,
    ) -> Result<Option<GenerationRecord>, AppError> {
        sqlx::query_as::<_, CvGenerationRow>(&format!(
            r#"
            UPDATE cv_generations
            SET professional_summary = $3,
                generated_content = jsonb_set(generated_content, '{{professionalSummary}}', to_jsonb($3::text)),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'completed'
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(summary)
        .fetch_optional(&self.pool)
        .await?
        .map(GenerationRecord::try_from)
        .transpose()
    }

    async fn set_pdf(
        &self,
        id: Uuid,
        storage_path: &str,
        url: &str,
    ) -> Result<GenerationRecord, AppError> {
        let row = sqlx::query_as::<_, CvGenerationRow>(&format!(
            r#"
            UPDATE cv_generations
            SET pdf_storage_path = $2, pdf_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(storage_path)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;

        row.try_into()
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError> {
        sqlx::query_as::<_, CvGenerationRow>(&format!(
            "DELETE FROM cv_generations WHERE id = $1 AND user_id = $2 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(GenerationRecord::try_from)
        .transpose()
    }
}
