//! In-memory fakes and sample data for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Router};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::analysis::JobAnalysis;
use crate::generation::generator::{ContentGenerator, GenerationError};
use crate::generation::store::GenerationStore;
use crate::models::content::fixtures::sample_content;
use crate::models::content::GeneratedCvContent;
use crate::models::cv::{CvStatus, CvType, GenerationRecord, NewGeneration};
use crate::models::profile::{
    CertificationRow, EducationRow, ExperienceRow, JobPostingRow, LanguageRow, ProfileRow,
    ProfileSnapshot, ProjectRow, SkillRow,
};
use crate::models::user::{QuotaState, SubscriptionType};
use crate::notify::{GenerationNotice, Notifier};
use crate::profiles::ProfileReader;
use crate::quota::store::QuotaStore;
use crate::render::pdf::PdfEngine;
use crate::render::photo::PhotoPolicy;
use crate::render::storage::ArtifactStore;

// ────────────────────────────────────────────────────────────────────────────
// Sample data
// ────────────────────────────────────────────────────────────────────────────

// ────────────────────────────────────────────────────────────────────────────
// Local Messages API stub
// ────────────────────────────────────────────────────────────────────────────

/// Serves a canned Messages API reply on a local port. Returns the endpoint URL.
pub async fn stub_llm_endpoint(status: StatusCode, body: String) -> String {
    let app = Router::new().route(
        "/v1/messages",
        post(move || {
            let body = body.clone();
            async move { (status, body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1/messages")
}

/// A successful Messages API body whose only text block is `text`.
pub fn llm_text_reply(text: &str) -> String {
    serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "usage": { "input_tokens": 12, "output_tokens": 34 }
    })
    .to_string()
}

/// Photos are accepted from this origin only.
pub const PHOTO_ORIGIN: &str = "https://cdn.example.com";

pub fn photo_policy() -> PhotoPolicy {
    PhotoPolicy::new(&[PHOTO_ORIGIN]).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn sample_profile(user_id: Uuid) -> ProfileSnapshot {
    ProfileSnapshot {
        profile: ProfileRow {
            id: Uuid::new_v4(),
            user_id,
            full_name: "Ada Example".into(),
            headline: Some("Backend Engineer".into()),
            email: Some("ada@example.com".into()),
            phone: None,
            location: Some("Berlin".into()),
            summary: Some("Builds reliable billing systems.".into()),
            photo_url: None,
            linkedin_url: Some("https://linkedin.com/in/ada-example".into()),
            github_url: None,
            website_url: None,
        },
        experiences: vec![ExperienceRow {
            company: "Ferrous Labs".into(),
            position: "Senior Engineer".into(),
            location: Some("Berlin".into()),
            start_date: date(2021, 3, 1),
            end_date: None,
            is_current: true,
            description: Some("Owned the billing pipeline.".into()),
            achievements: vec!["Cut invoice latency by 40%".into()],
        }],
        education: vec![EducationRow {
            institution: "TU Munich".into(),
            degree: "MSc".into(),
            field_of_study: Some("Informatics".into()),
            start_date: date(2015, 10, 1),
            end_date: date(2017, 9, 30),
            gpa: None,
            description: None,
        }],
        skills: vec![SkillRow {
            name: "Rust".into(),
            category: Some("Programming Languages".into()),
            proficiency_level: Some("Expert".into()),
        }],
        projects: vec![ProjectRow {
            name: "ledgerd".into(),
            description: Some("Append-only ledger service.".into()),
            technologies: vec!["Rust".into(), "Postgres".into()],
            url: None,
            github_url: Some("https://github.com/ada/ledgerd".into()),
        }],
        certifications: vec![CertificationRow {
            name: "CKA".into(),
            issuer: "CNCF".into(),
            issue_date: date(2023, 5, 1),
            expiry_date: None,
        }],
        languages: vec![LanguageRow {
            name: "German".into(),
            proficiency: Some("Native".into()),
        }],
    }
}

pub fn sample_job_posting(user_id: Uuid) -> JobPostingRow {
    JobPostingRow {
        id: Uuid::new_v4(),
        user_id,
        title: "Staff Backend Engineer".into(),
        company: Some("Tidewater".into()),
        location: Some("Remote (EU)".into()),
        description: "Lead the design of our event-driven payments platform.".into(),
        experience_level: Some("Senior".into()),
        required_skills: vec!["Rust".into(), "Kafka".into()],
        keywords: vec!["event sourcing".into(), "payments".into()],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryQuotaStore {
    users: Mutex<HashMap<Uuid, QuotaState>>,
}

impl MemoryQuotaStore {
    pub fn insert(&self, state: QuotaState) {
        self.users.lock().unwrap().insert(state.user_id, state);
    }

    pub fn get(&self, user_id: Uuid) -> Option<QuotaState> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<QuotaState>, AppError> {
        Ok(self.get(user_id))
    }

    async fn downgrade_to_free(&self, user_id: Uuid, reset_usage: bool) -> Result<(), AppError> {
        if let Some(state) = self.users.lock().unwrap().get_mut(&user_id) {
            state.subscription_type = SubscriptionType::Free;
            state.subscription_start_date = None;
            state.subscription_end_date = None;
            if reset_usage {
                state.job_based_cvs_used = 0;
                state.profile_based_cvs_used = 0;
            }
        }
        Ok(())
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        cv_type: CvType,
        limit: i32,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(state) = users.get_mut(&user_id) else {
            return Ok(false);
        };
        let counter = match cv_type {
            CvType::JobBased => &mut state.job_based_cvs_used,
            CvType::ProfileBased => &mut state.profile_based_cvs_used,
        };
        if *counter >= limit {
            return Ok(false);
        }
        *counter += 1;
        Ok(true)
    }

    async fn set_pro(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(state) = self.users.lock().unwrap().get_mut(&user_id) {
            state.subscription_type = SubscriptionType::Pro;
            state.subscription_start_date = Some(start);
            state.subscription_end_date = Some(end);
        }
        Ok(())
    }
}

/// Records in insertion order. Transition guards match the SQL store.
#[derive(Default)]
pub struct MemoryGenerationStore {
    records: Mutex<Vec<GenerationRecord>>,
}

impl MemoryGenerationStore {
    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.lock().unwrap().clone()
    }

    fn update<T>(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut GenerationRecord) -> Option<T>,
    ) -> Option<T> {
        let mut records = self.records.lock().unwrap();
        records.iter_mut().find(|r| r.id == id).and_then(apply)
    }
}

#[async_trait]
impl GenerationStore for MemoryGenerationStore {
    async fn create_pending(&self, new: NewGeneration) -> Result<GenerationRecord, AppError> {
        let now = Utc::now();
        let record = GenerationRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            profile_id: new.profile_id,
            job_posting_id: new.job_posting_id,
            status: CvStatus::Pending,
            cv_type: new.cv_type(),
            style: new.style,
            generated_content: None,
            professional_summary: None,
            error_message: None,
            pdf_url: None,
            pdf_storage_path: None,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        content: &GeneratedCvContent,
    ) -> Result<GenerationRecord, AppError> {
        self.update(id, |r| {
            (r.status == CvStatus::Pending).then(|| {
                r.status = CvStatus::Completed;
                r.generated_content = Some(content.clone());
                r.professional_summary = Some(content.professional_summary.clone());
                r.updated_at = Utc::now();
                r.clone()
            })
        })
        .ok_or_else(|| AppError::Conflict(format!("CV generation {id} is no longer pending")))
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError> {
        self.update(id, |r| {
            (r.status == CvStatus::Pending).then(|| {
                r.status = CvStatus::Failed;
                r.error_message = Some(error_message.to_string());
                r.updated_at = Utc::now();
            })
        });
        Ok(())
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<GenerationRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_summary(
        &self,
        user_id: Uuid,
        id: Uuid,
        summary: &str,
    ) -> Result<Option<GenerationRecord>, AppError> {
        Ok(self.update(id, |r| {
            if r.user_id != user_id || r.status != CvStatus::Completed {
                return None;
            }
            r.professional_summary = Some(summary.to_string());
            if let Some(content) = r.generated_content.as_mut() {
                content.professional_summary = summary.to_string();
            }
            r.updated_at = Utc::now();
            Some(r.clone())
        }))
    }

    async fn set_pdf(
        &self,
        id: Uuid,
        storage_path: &str,
        url: &str,
    ) -> Result<GenerationRecord, AppError> {
        self.update(id, |r| {
            r.pdf_storage_path = Some(storage_path.to_string());
            r.pdf_url = Some(url.to_string());
            r.updated_at = Utc::now();
            Some(r.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<Option<GenerationRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        let position = records
            .iter()
            .position(|r| r.id == id && r.user_id == user_id);
        Ok(position.map(|i| records.remove(i)))
    }
}

#[derive(Default)]
pub struct MemoryProfileReader {
    profiles: Mutex<Vec<ProfileSnapshot>>,
    job_postings: Mutex<Vec<JobPostingRow>>,
}

impl MemoryProfileReader {
    pub fn insert_profile(&self, snapshot: ProfileSnapshot) {
        self.profiles.lock().unwrap().push(snapshot);
    }

    pub fn insert_job_posting(&self, job: JobPostingRow) {
        self.job_postings.lock().unwrap().push(job);
    }
}

#[async_trait]
impl ProfileReader for MemoryProfileReader {
    async fn profile(
        &self,
        user_id: Uuid,
        profile_id: Uuid,
    ) -> Result<Option<ProfileSnapshot>, AppError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.profile.id == profile_id && s.profile.user_id == user_id)
            .cloned())
    }

    async fn job_posting(
        &self,
        user_id: Uuid,
        job_posting_id: Uuid,
    ) -> Result<Option<JobPostingRow>, AppError> {
        Ok(self
            .job_postings
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == job_posting_id && j.user_id == user_id)
            .cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AI, notifications, rendering
// ────────────────────────────────────────────────────────────────────────────

type Outcome = Box<dyn Fn() -> Result<GeneratedCvContent, GenerationError> + Send + Sync>;

/// Generator with a fixed outcome. Records every prompt it receives.
pub struct ScriptedGenerator {
    outcome: Outcome,
    delay: Option<Duration>,
    analysis: JobAnalysis,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: None,
            analysis: JobAnalysis::empty(),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_outcome(Box::new(|| Ok(sample_content())))
    }

    pub fn failing(make: impl Fn() -> GenerationError + Send + Sync + 'static) -> Self {
        Self::with_outcome(Box::new(move || Err(make())))
    }

    /// Never answers within any realistic timeout.
    pub fn hanging() -> Self {
        Self::succeeding().with_delay(Duration::from_secs(24 * 60 * 60))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, instruction: &str) -> Result<GeneratedCvContent, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(instruction.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.outcome)()
    }

    async fn analyze_job(
        &self,
        _job: &JobPostingRow,
        profile: Option<&ProfileSnapshot>,
    ) -> JobAnalysis {
        self.analysis.clone().normalized(profile.is_some())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<GenerationNotice>>,
    fail_next: AtomicBool,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<GenerationNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn generation_completed(&self, notice: &GenerationNotice) -> anyhow::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("mail server unavailable");
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Returns a tiny fixed PDF and counts calls.
#[derive(Default)]
pub struct FakePdfEngine {
    calls: AtomicUsize,
}

impl FakePdfEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfEngine for FakePdfEngine {
    async fn print_pdf(&self, html: &str) -> Result<Vec<u8>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("%PDF-1.7 fake ({} bytes of html)", html.len()).into_bytes())
    }
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryArtifactStore {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<(), AppError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from(body));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
