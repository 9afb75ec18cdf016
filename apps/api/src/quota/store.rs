use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::CvType;
use crate::models::user::{QuotaState, UserQuotaRow};

/// Persistence for plan and usage counters. Counters are only ever changed through
/// `try_increment` (compare-and-increment) and `downgrade_to_free(reset_usage = true)`.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<QuotaState>, AppError>;

    /// Sets FREE and clears subscription dates. Resets both counters when `reset_usage`.
    async fn downgrade_to_free(&self, user_id: Uuid, reset_usage: bool) -> Result<(), AppError>;

    /// Atomically adds one to the counter for `cv_type` if it is still below `limit`.
    /// Returns `false` when the counter was already at the limit.
    async fn try_increment(&self, user_id: Uuid, cv_type: CvType, limit: i32)
        -> Result<bool, AppError>;

    async fn set_pro(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// `users` table backed store.
pub struct PgQuotaStore {
    pool: PgPool,
}

impl PgQuotaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<QuotaState>, AppError> {
        let row = sqlx::query_as::<_, UserQuotaRow>(
            r#"
            SELECT id, subscription_type, subscription_start_date, subscription_end_date,
                   job_based_cvs_used, profile_based_cvs_used
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuotaState::from))
    }

    async fn downgrade_to_free(&self, user_id: Uuid, reset_usage: bool) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET subscription_type = 'FREE',
                subscription_start_date = NULL,
                subscription_end_date = NULL,
                job_based_cvs_used = CASE WHEN $2 THEN 0 ELSE job_based_cvs_used END,
                profile_based_cvs_used = CASE WHEN $2 THEN 0 ELSE profile_based_cvs_used END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(reset_usage)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        cv_type: CvType,
        limit: i32,
    ) -> Result<bool, AppError> {
        // Column names cannot be bound, so pick the statement per counter.
        let sql = match cv_type {
            CvType::JobBased => {
                r#"
                UPDATE users
                SET job_based_cvs_used = job_based_cvs_used + 1, updated_at = NOW()
                WHERE id = $1 AND job_based_cvs_used < $2
                "#
            }
            CvType::ProfileBased => {
                r#"
                UPDATE users
                SET profile_based_cvs_used = profile_based_cvs_used + 1, updated_at = NOW()
                WHERE id = $1 AND profile_based_cvs_used < $2
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(user_id)
            .bind(limit)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_pro(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET subscription_type = 'PRO',
                subscription_start_date = $2,
                subscription_end_date = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
        Ok(())
    }
}
