//! Generation Orchestrator — the request pipeline for one CV.
//!
//! validate → lock user → quota check → load profile/job → pending record →
//! prompt → AI call (bounded) → completed record → usage increment → notify.
//!
//! The per-user lock is held from the quota check until after the increment, so
//! two requests from one user cannot both spend the same remaining slot. Quota is
//! only incremented for completed records; a failed attempt costs nothing.
//!
//! Once the pending record exists, the rest of the pipeline runs on its own task.
//! A client that disconnects mid-call drops only the wait, never the resolution of
//! the record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{ContentGenerator, GenerationError};
use crate::generation::prompt_builder::{build_prompt, DEFAULT_LANGUAGE};
use crate::generation::store::GenerationStore;
use crate::generation::tone::DEFAULT_TONE;
use crate::models::content::GeneratedCvContent;
use crate::models::cv::{CvStatus, CvType, GenerationRecord, NewGeneration, StyleOptions};
use crate::models::profile::{JobPostingRow, ProfileSnapshot};
use crate::notify::{spawn_generation_completed, Notifier};
use crate::profiles::{require_job_posting, require_profile, ProfileReader};
use crate::quota::lock::{LockGuard, UserLock};
use crate::quota::{QuotaDecision, QuotaLedger};
use crate::render::photo::PhotoPolicy;
use crate::render::templates::{check_template_access, require_template, DEFAULT_TEMPLATE};

/// Body of `POST /api/v1/cvs/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCvRequest {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub job_posting_id: Option<Uuid>,
    pub tone: Option<String>,
    pub template_name: Option<String>,
    pub include_profile_picture: Option<bool>,
    pub cv_specific_photo_url: Option<String>,
    pub content_language: Option<String>,
}

impl GenerateCvRequest {
    /// Applies defaults. Blank strings count as absent.
    fn style(&self) -> StyleOptions {
        StyleOptions {
            tone: non_blank(&self.tone).unwrap_or_else(|| DEFAULT_TONE.to_string()),
            template_name: non_blank(&self.template_name)
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            content_language: non_blank(&self.content_language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            include_profile_picture: self.include_profile_picture.unwrap_or(false),
            cv_specific_photo_url: non_blank(&self.cv_specific_photo_url),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Tunables of the pipeline.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Upper bound on one AI call.
    pub timeout: Duration,
    /// Where CV-specific photos may be hosted.
    pub photos: PhotoPolicy,
}

/// Everything the detached part of the pipeline needs.
struct Admitted {
    pending: GenerationRecord,
    snapshot: ProfileSnapshot,
    job: Option<JobPostingRow>,
    decision: QuotaDecision,
}

#[derive(Clone)]
pub struct GenerationOrchestrator {
    quota: QuotaLedger,
    locks: Arc<dyn UserLock>,
    profiles: Arc<dyn ProfileReader>,
    generator: Arc<dyn ContentGenerator>,
    store: Arc<dyn GenerationStore>,
    notifier: Arc<dyn Notifier>,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    pub fn new(
        quota: QuotaLedger,
        locks: Arc<dyn UserLock>,
        profiles: Arc<dyn ProfileReader>,
        generator: Arc<dyn ContentGenerator>,
        store: Arc<dyn GenerationStore>,
        notifier: Arc<dyn Notifier>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            quota,
            locks,
            profiles,
            generator,
            store,
            notifier,
            settings,
        }
    }

    /// Runs one generation end to end.
    ///
    /// Errors before the pending record exists (validation, quota, ownership) leave
    /// no trace. Errors after it mark the record `failed` and surface as
    /// `GenerationFailed` carrying the failed record.
    pub async fn generate(&self, request: GenerateCvRequest) -> Result<GenerationRecord, AppError> {
        let style = request.style();
        let template = require_template(&style.template_name)?;
        if let Some(url) = &style.cv_specific_photo_url {
            self.settings.photos.check(url)?;
        }
        let cv_type = CvType::for_job_posting(request.job_posting_id);
        let user_id = request.user_id;

        let guard = self.locks.acquire(user_id).await?;

        let decision = self.quota.can_generate(user_id, cv_type).await?.into_result()?;
        check_template_access(template, decision.plan)?;

        let snapshot = require_profile(self.profiles.as_ref(), user_id, request.profile_id).await?;
        let job = match request.job_posting_id {
            Some(id) => Some(require_job_posting(self.profiles.as_ref(), user_id, id).await?),
            None => None,
        };

        let pending = self
            .store
            .create_pending(NewGeneration {
                user_id,
                profile_id: request.profile_id,
                job_posting_id: request.job_posting_id,
                style,
            })
            .await?;
        info!(
            "Started {cv_type} CV generation {} for user {user_id} ({} plan)",
            pending.id, decision.plan
        );

        let fallback = pending.clone();
        let this = self.clone();
        let task = tokio::spawn(async move {
            this.resolve(
                Admitted {
                    pending,
                    snapshot,
                    job,
                    decision,
                },
                guard,
            )
            .await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Generation task for CV {} aborted: {e}", fallback.id);
                Err(self
                    .fail(&fallback, "Generation was interrupted".to_string())
                    .await)
            }
        }
    }

    /// Steps after the pending record exists. Always leaves the record `completed`
    /// or `failed`. The lock is released when this returns.
    async fn resolve(
        &self,
        admitted: Admitted,
        _guard: LockGuard,
    ) -> Result<GenerationRecord, AppError> {
        let Admitted {
            pending,
            snapshot,
            job,
            decision,
        } = admitted;

        let content = match self.produce(&pending, &snapshot, job.as_ref()).await {
            Ok(content) => content,
            Err(e) => return Err(self.fail(&pending, e.to_string()).await),
        };

        let record = match self.store.mark_completed(pending.id, &content).await {
            Ok(record) => record,
            Err(e) => {
                error!("Could not store content for CV {}: {e}", pending.id);
                return Err(self
                    .fail(&pending, "Generated content could not be saved".to_string())
                    .await);
            }
        };

        if let Err(e) = self.quota.increment_usage(record.user_id, &decision).await {
            error!("CV {} completed but usage increment failed: {e}", record.id);
        }

        spawn_generation_completed(self.notifier.clone(), &record);
        info!("Completed CV generation {}", record.id);
        Ok(record)
    }

    /// Builds the prompt and performs the bounded AI call.
    async fn produce(
        &self,
        pending: &GenerationRecord,
        snapshot: &ProfileSnapshot,
        job: Option<&JobPostingRow>,
    ) -> Result<GeneratedCvContent, GenerationError> {
        let prompt = build_prompt(
            snapshot,
            job,
            &pending.style.tone,
            &pending.style.content_language,
        );

        let timeout = self.settings.timeout;
        tokio::time::timeout(timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(timeout.as_secs()))?
    }

    async fn fail(&self, pending: &GenerationRecord, message: String) -> AppError {
        warn!("CV generation {} failed: {message}", pending.id);
        if let Err(e) = self.store.mark_failed(pending.id, &message).await {
            error!("Could not mark CV {} as failed: {e}", pending.id);
        }

        let mut record = pending.clone();
        record.status = CvStatus::Failed;
        record.error_message = Some(message.clone());
        record.updated_at = Utc::now();
        AppError::GenerationFailed {
            message,
            record: Box::new(record),
        }
    }
}
