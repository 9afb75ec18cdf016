//! Render service — the calling layer around `CvRenderer` for stored records.
//!
//! Loads the owner's completed record, resolves and authorizes the template, builds
//! header metadata from the profile and records where the PDF went. Content, status
//! and quota are never touched here.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::store::GenerationStore;
use crate::models::cv::{CvStatus, GenerationRecord};
use crate::models::profile::ProfileRow;
use crate::profiles::{require_profile, ProfileReader};
use crate::quota::QuotaLedger;
use crate::render::templates::{check_template_access, require_template};
use crate::render::{download_url, CvRenderer, RenderMetadata};

#[derive(Clone)]
pub struct RenderService {
    store: Arc<dyn GenerationStore>,
    profiles: Arc<dyn ProfileReader>,
    quota: QuotaLedger,
    renderer: CvRenderer,
}

impl RenderService {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        profiles: Arc<dyn ProfileReader>,
        quota: QuotaLedger,
        renderer: CvRenderer,
    ) -> Self {
        Self {
            store,
            profiles,
            quota,
            renderer,
        }
    }

    /// Renders a completed record to PDF with the record's template, or `template_override`.
    pub async fn render_cv(
        &self,
        user_id: Uuid,
        cv_id: Uuid,
        template_override: Option<&str>,
    ) -> Result<GenerationRecord, AppError> {
        let record = self.owned_record(user_id, cv_id).await?;
        if record.status != CvStatus::Completed {
            return Err(AppError::Conflict(format!(
                "CV {cv_id} is {} and cannot be rendered",
                record.status.as_str()
            )));
        }
        let content = record.generated_content.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("completed CV {cv_id} has no content"))
        })?;

        let template_id = template_override.unwrap_or(record.style.template_name.as_str());
        let template = require_template(template_id)?;
        if template.is_premium {
            let plan = self.quota.effective_plan(user_id).await?;
            check_template_access(template, plan)?;
        }

        let snapshot = require_profile(self.profiles.as_ref(), user_id, record.profile_id).await?;
        let metadata = build_metadata(&record, &snapshot.profile);

        let path = self.renderer.render(content, &metadata, template.id).await?;
        let updated = self.store.set_pdf(cv_id, &path, &download_url(cv_id)).await?;

        info!("CV {cv_id} rendered to {path}");
        Ok(updated)
    }

    /// PDF bytes of a rendered record.
    pub async fn download(&self, user_id: Uuid, cv_id: Uuid) -> Result<Bytes, AppError> {
        let record = self.owned_record(user_id, cv_id).await?;
        let path = record
            .pdf_storage_path
            .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} has not been rendered yet")))?;

        self.renderer
            .artifacts()
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("PDF for CV {cv_id} not found")))
    }

    /// Best-effort removal of a deleted record's PDF.
    pub async fn discard_artifact(&self, record: &GenerationRecord) {
        let Some(path) = record.pdf_storage_path.as_deref() else {
            return;
        };
        if let Err(e) = self.renderer.artifacts().delete(path).await {
            warn!("Could not delete PDF {path} of CV {}: {e}", record.id);
        }
    }

    async fn owned_record(&self, user_id: Uuid, cv_id: Uuid) -> Result<GenerationRecord, AppError> {
        self.store
            .find(user_id, cv_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))
    }
}

/// Header metadata. A CV-specific photo wins; otherwise the profile photo is used
/// only when the record asked for it.
fn build_metadata(record: &GenerationRecord, profile: &ProfileRow) -> RenderMetadata {
    let photo_url = record.style.cv_specific_photo_url.clone().or_else(|| {
        record
            .style
            .include_profile_picture
            .then(|| profile.photo_url.clone())
            .flatten()
    });

    RenderMetadata {
        cv_id: record.id,
        language: record.style.content_language.clone(),
        full_name: profile.full_name.clone(),
        headline: profile.headline.clone(),
        email: profile.email.clone(),
        phone: profile.phone.clone(),
        location: profile.location.clone(),
        linkedin_url: profile.linkedin_url.clone(),
        github_url: profile.github_url.clone(),
        website_url: profile.website_url.clone(),
        photo_url,
    }
}
