//! AI Content Generator — executes the external completion call and returns validated
//! CV content. Also hosts the best-effort job analysis call.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::analysis::{build_analysis_prompt, JobAnalysis};
use crate::generation::prompts::{CV_GENERATION_SYSTEM, JOB_ANALYSIS_SYSTEM};
use crate::llm_client::{CallOptions, LlmClient, LlmError};
use crate::models::content::GeneratedCvContent;
use crate::models::profile::{JobPostingRow, ProfileSnapshot};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI service call failed: {0}")]
    Llm(LlmError),

    #[error("AI service returned an empty response")]
    Empty,

    #[error("AI response is not valid CV JSON: {0}")]
    InvalidJson(String),

    #[error("AI response failed validation: {0}")]
    InvalidContent(String),

    #[error("AI generation timed out after {0}s")]
    Timeout(u64),
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => GenerationError::Empty,
            LlmError::Parse(e) => GenerationError::InvalidJson(e.to_string()),
            other => GenerationError::Llm(other),
        }
    }
}

/// The seam between the orchestrator and the AI provider.
///
/// Carried in `AppState` as `Arc<dyn ContentGenerator>`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// One generation call. Partial or malformed output is an error, never a default.
    async fn generate(&self, instruction: &str) -> Result<GeneratedCvContent, GenerationError>;

    /// Best-effort analysis. Never fails; returns `JobAnalysis::empty()` on any error.
    async fn analyze_job(
        &self,
        job: &JobPostingRow,
        profile: Option<&ProfileSnapshot>,
    ) -> JobAnalysis;
}

/// Claude-backed generator.
pub struct LlmContentGenerator {
    llm: LlmClient,
}

impl LlmContentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, instruction: &str) -> Result<GeneratedCvContent, GenerationError> {
        let content: GeneratedCvContent = self
            .llm
            .call_json_object(instruction, CV_GENERATION_SYSTEM, CallOptions::generation())
            .await?;

        content.validate().map_err(GenerationError::InvalidContent)?;

        info!(
            "Generated CV content: {} experiences, {} skills",
            content.work_experience.len(),
            content.skills.len()
        );
        Ok(content)
    }

    async fn analyze_job(
        &self,
        job: &JobPostingRow,
        profile: Option<&ProfileSnapshot>,
    ) -> JobAnalysis {
        let prompt = build_analysis_prompt(job, profile);

        match self
            .llm
            .call_json_object::<JobAnalysis>(&prompt, JOB_ANALYSIS_SYSTEM, CallOptions::analysis())
            .await
        {
            Ok(analysis) => analysis.normalized(profile.is_some()),
            Err(e) => {
                warn!("Job analysis for posting {} failed, returning empty analysis: {e}", job.id);
                JobAnalysis::empty()
            }
        }
    }
}
