//! Document Renderer — turns generated CV content into a stored A4 PDF.
//!
//! content + header metadata → Handlebars HTML → headless Chromium → object storage
//! at `cvs/{cv_id}.pdf`. Rendering the same record again overwrites the same object.

pub mod handlers;
pub mod pdf;
pub mod photo;
pub mod service;
pub mod skills;
pub mod storage;
pub mod templates;

use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::content::{
    CertificationItem, EducationItem, GeneratedCvContent, LanguageItem, ProjectItem,
    SectionTitles, WorkExperienceItem,
};
use crate::render::pdf::PdfEngine;
use crate::render::photo::PhotoPolicy;
use crate::render::skills::{group_skills, SkillGroup};
use crate::render::storage::ArtifactStore;
use crate::render::templates::{build_registry, require_template};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Object key of a record's PDF.
pub fn storage_path(cv_id: Uuid) -> String {
    format!("cvs/{cv_id}.pdf")
}

/// API path that serves a record's PDF.
pub fn download_url(cv_id: Uuid) -> String {
    format!("/api/v1/cvs/{cv_id}/pdf")
}

/// Header data that does not come from the generated content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMetadata {
    #[serde(skip)]
    pub cv_id: Uuid,
    #[serde(skip)]
    pub language: String,
    pub full_name: String,
    pub headline: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub website_url: Option<String>,
    pub photo_url: Option<String>,
}

/// Everything a template can reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateContext<'a> {
    lang: &'a str,
    present_label: &'static str,
    header: &'a RenderMetadata,
    titles: &'a SectionTitles,
    summary: &'a str,
    experience: &'a [WorkExperienceItem],
    education: &'a [EducationItem],
    skill_groups: Vec<SkillGroup>,
    projects: &'a [ProjectItem],
    certifications: &'a [CertificationItem],
    languages: &'a [LanguageItem],
}

/// Label for an open-ended date range in the content language.
fn present_label(language: &str) -> &'static str {
    match language.trim().to_ascii_lowercase().as_str() {
        "de" => "heute",
        "fr" => "présent",
        "es" => "actualidad",
        "it" => "presente",
        "pt" => "atual",
        "nl" => "heden",
        "pl" => "obecnie",
        "tr" => "halen",
        _ => "Present",
    }
}

#[derive(Clone)]
pub struct CvRenderer {
    registry: Arc<Handlebars<'static>>,
    engine: Arc<dyn PdfEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    photos: PhotoPolicy,
}

impl CvRenderer {
    pub fn new(
        engine: Arc<dyn PdfEngine>,
        artifacts: Arc<dyn ArtifactStore>,
        photos: PhotoPolicy,
    ) -> Result<Self, AppError> {
        Ok(Self {
            registry: Arc::new(build_registry()?),
            engine,
            artifacts,
            photos,
        })
    }

    /// Fills the template. Values are HTML-escaped by Handlebars; a photo URL
    /// outside the photo policy is left out.
    pub fn render_html(
        &self,
        content: &GeneratedCvContent,
        metadata: &RenderMetadata,
        template_id: &str,
    ) -> Result<String, AppError> {
        let template = require_template(template_id)?;
        let mut header = metadata.clone();
        if let Some(url) = header.photo_url.take() {
            if self.photos.allows(&url) {
                header.photo_url = Some(url);
            } else {
                warn!("Dropping disallowed photo URL from CV {}", metadata.cv_id);
            }
        }

        let context = TemplateContext {
            lang: &metadata.language,
            present_label: present_label(&metadata.language),
            header: &header,
            titles: &content.section_titles,
            summary: &content.professional_summary,
            experience: &content.work_experience,
            education: &content.education,
            skill_groups: group_skills(&content.skills),
            projects: &content.projects,
            certifications: &content.certifications,
            languages: &content.languages,
        };

        self.registry
            .render(template.id, &context)
            .map_err(|e| AppError::RenderFailed(format!("template '{}': {e}", template.id)))
    }

    /// Renders and stores the PDF. Returns the storage path.
    pub async fn render(
        &self,
        content: &GeneratedCvContent,
        metadata: &RenderMetadata,
        template_id: &str,
    ) -> Result<String, AppError> {
        let html = self.render_html(content, metadata, template_id)?;
        let pdf = self.engine.print_pdf(&html).await?;

        let path = storage_path(metadata.cv_id);
        self.artifacts.put(&path, pdf, PDF_CONTENT_TYPE).await?;

        info!("Rendered CV {} with template '{template_id}'", metadata.cv_id);
        Ok(path)
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactStore> {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::fixtures::sample_content;
    use crate::testing::{photo_policy, FakePdfEngine, MemoryArtifactStore};

    fn renderer() -> (CvRenderer, Arc<FakePdfEngine>, Arc<MemoryArtifactStore>) {
        let engine = Arc::new(FakePdfEngine::default());
        let artifacts = Arc::new(MemoryArtifactStore::default());
        let renderer = CvRenderer::new(engine.clone(), artifacts.clone(), photo_policy()).unwrap();
        (renderer, engine, artifacts)
    }

    fn metadata(cv_id: Uuid) -> RenderMetadata {
        RenderMetadata {
            cv_id,
            language: "de".to_string(),
            full_name: "Ada Example".to_string(),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_storage_path_and_url_are_derived_from_id() {
        let id = Uuid::nil();
        assert_eq!(storage_path(id), "cvs/00000000-0000-0000-0000-000000000000.pdf");
        assert_eq!(download_url(id), "/api/v1/cvs/00000000-0000-0000-0000-000000000000/pdf");
    }

    #[test]
    fn test_html_contains_content_and_localized_labels() {
        let (renderer, _, _) = renderer();
        let html = renderer
            .render_html(&sample_content(), &metadata(Uuid::new_v4()), "modern")
            .unwrap();

        assert!(html.contains("<html lang=\"de\">"));
        assert!(html.contains("Ada Example"));
        assert!(html.contains("Ferrous Labs"));
        assert!(html.contains("Cut invoice latency by 40%"));
        assert!(html.contains("2021-03 – heute"));
        assert!(html.contains("Programming Languages"));
        assert!(html.contains("@page { size: A4; margin: 0; }"));
    }

    #[test]
    fn test_html_escapes_user_text() {
        let (renderer, _, _) = renderer();
        let mut content = sample_content();
        content.professional_summary = "<script>alert(1)</script>".to_string();

        let html = renderer
            .render_html(&content, &metadata(Uuid::new_v4()), "classic")
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_photo_only_rendered_when_present() {
        let (renderer, _, _) = renderer();
        let mut meta = metadata(Uuid::new_v4());

        let html = renderer.render_html(&sample_content(), &meta, "minimal").unwrap();
        assert!(!html.contains("class=\"photo\""));

        meta.photo_url = Some("https://cdn.example.com/ada.jpg".to_string());
        let html = renderer.render_html(&sample_content(), &meta, "minimal").unwrap();
        assert!(html.contains("src=\"https://cdn.example.com/ada.jpg\""));
    }

    #[test]
    fn test_photo_outside_allowed_origins_is_not_rendered() {
        let (renderer, _, _) = renderer();
        let mut meta = metadata(Uuid::new_v4());

        for url in ["file:///etc/shadow", "http://169.254.169.254/latest/meta-data/"] {
            meta.photo_url = Some(url.to_string());
            let html = renderer.render_html(&sample_content(), &meta, "modern").unwrap();
            assert!(!html.contains("class=\"photo\""), "{url}");
            assert!(!html.contains(url), "{url}");
        }
    }

    #[test]
    fn test_present_label_ignores_case_and_covers_turkish() {
        assert_eq!(present_label("DE"), "heute");
        assert_eq!(present_label("tr"), "halen");
        assert_eq!(present_label(" Tr "), "halen");
        assert_eq!(present_label("en"), "Present");
        assert_eq!(present_label("xx"), "Present");
    }

    #[test]
    fn test_every_registered_template_renders() {
        let (renderer, _, _) = renderer();
        for template in templates::TEMPLATES {
            let html = renderer
                .render_html(&sample_content(), &metadata(Uuid::new_v4()), template.id)
                .unwrap();
            assert!(html.contains("Ferrous Labs"), "{}", template.id);
        }
    }

    #[tokio::test]
    async fn test_render_stores_pdf_at_deterministic_path_and_overwrites() {
        let (renderer, engine, artifacts) = renderer();
        let cv_id = Uuid::new_v4();

        let first = renderer
            .render(&sample_content(), &metadata(cv_id), "modern")
            .await
            .unwrap();
        let second = renderer
            .render(&sample_content(), &metadata(cv_id), "classic")
            .await
            .unwrap();

        assert_eq!(first, storage_path(cv_id));
        assert_eq!(first, second);
        assert_eq!(artifacts.keys(), vec![storage_path(cv_id)]);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_template_stores_nothing() {
        let (renderer, engine, artifacts) = renderer();
        let err = renderer
            .render(&sample_content(), &metadata(Uuid::new_v4()), "neon")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(engine.calls(), 0);
        assert!(artifacts.keys().is_empty());
    }
}
