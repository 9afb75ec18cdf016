//! Read-only access to profile and job-posting data.
//!
//! The CRUD services own these tables. Every lookup here is scoped by owner, so an
//! id that belongs to another user is indistinguishable from one that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    CertificationRow, EducationRow, ExperienceRow, JobPostingRow, LanguageRow, ProfileRow,
    ProfileSnapshot, ProjectRow, SkillRow,
};

#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// The full profile, or `None` if it does not exist or belongs to someone else.
    async fn profile(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileSnapshot>, AppError>;

    /// The job posting, or `None` if it does not exist or belongs to someone else.
    async fn job_posting(
        &self,
        user_id: Uuid,
        job_posting_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError>;
}

/// Loads an owned profile or fails with the same `NotFound` for missing and foreign ids.
pub async fn require_profile(
    reader: &dyn ProfileReader,
    user_id: Uuid,
    profile_id: Uuid,
) -> Result<ProfileSnapshot, AppError> {
    reader
        .profile(user_id, profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {profile_id} not found")))
}

/// Loads an owned job posting or fails with `NotFound`.
pub async fn require_job_posting(
    reader: &dyn ProfileReader,
    user_id: Uuid,
    job_posting_id: Uuid,
) -> Result<JobPostingRow, AppError> {
    reader
        .job_posting(user_id, job_posting_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job posting {job_posting_id} not found")))
}

pub struct PgProfileReader {
    pool: PgPool,
}

impl PgProfileReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileReader for PgProfileReader {
    async fn profile(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileSnapshot>, AppError> {
        let Some(profile) = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, user_id, full_name, headline, email, phone, location, summary,
                   photo_url, linkedin_url, github_url, website_url
            FROM profiles
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(profile_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let experiences = sqlx::query_as::<_, ExperienceRow>(
            r#"
            SELECT company, position, location, start_date, end_date, is_current,
                   description, achievements
            FROM work_experiences
            WHERE profile_id = $1
            ORDER BY is_current DESC, start_date DESC NULLS LAST
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let education = sqlx::query_as::<_, EducationRow>(
            r#"
            SELECT institution, degree, field_of_study, start_date, end_date, gpa, description
            FROM educations
            WHERE profile_id = $1
            ORDER BY start_date DESC NULLS LAST
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let skills = sqlx::query_as::<_, SkillRow>(
            "SELECT name, category, proficiency_level FROM skills WHERE profile_id = $1 ORDER BY sort_order",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let projects = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT name, description, technologies, url, github_url
            FROM projects
            WHERE profile_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let certifications = sqlx::query_as::<_, CertificationRow>(
            r#"
            SELECT name, issuer, issue_date, expiry_date
            FROM certifications
            WHERE profile_id = $1
            ORDER BY issue_date DESC NULLS LAST
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let languages = sqlx::query_as::<_, LanguageRow>(
            "SELECT name, proficiency FROM languages WHERE profile_id = $1 ORDER BY sort_order",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ProfileSnapshot {
            profile,
            experiences,
            education,
            skills,
            projects,
            certifications,
            languages,
        }))
    }

    async fn job_posting(
        &self,
        user_id: Uuid,
        job_posting_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError> {
        Ok(sqlx::query_as::<_, JobPostingRow>(
            r#"
            SELECT id, user_id, title, company, location, description, experience_level,
                   required_skills, keywords
            FROM job_postings
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(job_posting_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
