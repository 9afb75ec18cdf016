use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::content::GeneratedCvContent;

/// Classification of a generation request. Each type has its own FREE-plan counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CvType {
    ProfileBased,
    JobBased,
}

impl CvType {
    /// JOB_BASED iff a job posting was supplied.
    pub fn for_job_posting(job_posting_id: Option<Uuid>) -> Self {
        if job_posting_id.is_some() {
            CvType::JobBased
        } else {
            CvType::ProfileBased
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CvType::ProfileBased => "PROFILE_BASED",
            CvType::JobBased => "JOB_BASED",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PROFILE_BASED" => Some(CvType::ProfileBased),
            "JOB_BASED" => Some(CvType::JobBased),
            _ => None,
        }
    }
}

impl fmt::Display for CvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a generation record: `pending` → `completed` | `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvStatus {
    Pending,
    Completed,
    Failed,
}

impl CvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CvStatus::Pending => "pending",
            CvStatus::Completed => "completed",
            CvStatus::Failed => "failed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(CvStatus::Pending),
            "completed" => Some(CvStatus::Completed),
            "failed" => Some(CvStatus::Failed),
            _ => None,
        }
    }
}

/// Style inputs recorded verbatim at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    pub tone: String,
    pub template_name: String,
    pub content_language: String,
    pub include_profile_picture: bool,
    pub cv_specific_photo_url: Option<String>,
}

/// Everything needed to insert a `pending` record.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub job_posting_id: Option<Uuid>,
    pub style: StyleOptions,
}

impl NewGeneration {
    pub fn cv_type(&self) -> CvType {
        CvType::for_job_posting(self.job_posting_id)
    }
}

/// One CV generation attempt, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub job_posting_id: Option<Uuid>,
    pub status: CvStatus,
    pub cv_type: CvType,
    #[serde(flatten)]
    pub style: StyleOptions,
    pub generated_content: Option<GeneratedCvContent>,
    pub professional_summary: Option<String>,
    pub error_message: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of `cv_generations`.
#[derive(Debug, Clone, FromRow)]
pub struct CvGenerationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub job_posting_id: Option<Uuid>,
    pub status: String,
    pub cv_type: String,
    pub tone: String,
    pub template_name: String,
    pub content_language: String,
    pub include_profile_picture: bool,
    pub cv_specific_photo_url: Option<String>,
    pub generated_content: Option<Json<GeneratedCvContent>>,
    pub professional_summary: Option<String>,
    pub error_message: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_storage_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CvGenerationRow> for GenerationRecord {
    type Error = AppError;

    fn try_from(row: CvGenerationRow) -> Result<Self, Self::Error> {
        let status = CvStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cv_generations {} has unknown status '{}'",
                row.id,
                row.status
            ))
        })?;
        let cv_type = CvType::parse(&row.cv_type).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cv_generations {} has unknown cv_type '{}'",
                row.id,
                row.cv_type
            ))
        })?;

        Ok(GenerationRecord {
            id: row.id,
            user_id: row.user_id,
            profile_id: row.profile_id,
            job_posting_id: row.job_posting_id,
            status,
            cv_type,
            style: StyleOptions {
                tone: row.tone,
                template_name: row.template_name,
                content_language: row.content_language,
                include_profile_picture: row.include_profile_picture,
                cv_specific_photo_url: row.cv_specific_photo_url,
            },
            generated_content: row.generated_content.map(|Json(content)| content),
            professional_summary: row.professional_summary,
            error_message: row.error_message,
            pdf_url: row.pdf_url,
            pdf_storage_path: row.pdf_storage_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_type_follows_job_posting_presence() {
        assert_eq!(CvType::for_job_posting(None), CvType::ProfileBased);
        assert_eq!(
            CvType::for_job_posting(Some(Uuid::new_v4())),
            CvType::JobBased
        );
    }

    #[test]
    fn test_cv_type_wire_names() {
        assert_eq!(
            serde_json::to_value(CvType::JobBased).unwrap(),
            serde_json::json!("JOB_BASED")
        );
        assert_eq!(CvType::parse("PROFILE_BASED"), Some(CvType::ProfileBased));
        assert_eq!(CvType::parse("job_based"), None);
    }
}
