//! The structured CV content produced by the AI call and consumed by the renderer.
//!
//! Decoding is strict: every required field must be present. Optional fields are
//! `Option`s. After decoding, `validate()` rejects blank required values so a
//! half-filled answer is never persisted as `completed`.

use serde::{Deserialize, Serialize};

/// Localized labels for each CV section, written in the requested content language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTitles {
    pub professional_summary: String,
    pub work_experience: String,
    pub education: String,
    pub skills: String,
    pub projects: String,
    pub certifications: String,
    pub languages: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceItem {
    pub company: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    pub institution: String,
    pub degree: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationItem {
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<String>,
}

/// Full AI output for one CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCvContent {
    pub section_titles: SectionTitles,
    pub professional_summary: String,
    pub work_experience: Vec<WorkExperienceItem>,
    pub education: Vec<EducationItem>,
    pub skills: Vec<SkillItem>,
    pub projects: Vec<ProjectItem>,
    pub certifications: Vec<CertificationItem>,
    pub languages: Vec<LanguageItem>,
}

impl GeneratedCvContent {
    /// Checks required values that serde cannot: non-blank strings.
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        let titles = &self.section_titles;
        for (field, value) in [
            ("sectionTitles.professionalSummary", &titles.professional_summary),
            ("sectionTitles.workExperience", &titles.work_experience),
            ("sectionTitles.education", &titles.education),
            ("sectionTitles.skills", &titles.skills),
            ("sectionTitles.projects", &titles.projects),
            ("sectionTitles.certifications", &titles.certifications),
            ("sectionTitles.languages", &titles.languages),
            ("professionalSummary", &self.professional_summary),
        ] {
            require(field, value)?;
        }

        for (i, item) in self.work_experience.iter().enumerate() {
            require(&format!("workExperience[{i}].company"), &item.company)?;
            require(&format!("workExperience[{i}].position"), &item.position)?;
            require(&format!("workExperience[{i}].startDate"), &item.start_date)?;
        }
        for (i, item) in self.education.iter().enumerate() {
            require(&format!("education[{i}].institution"), &item.institution)?;
            require(&format!("education[{i}].degree"), &item.degree)?;
            require(&format!("education[{i}].startDate"), &item.start_date)?;
        }
        for (i, item) in self.skills.iter().enumerate() {
            require(&format!("skills[{i}].name"), &item.name)?;
        }
        for (i, item) in self.projects.iter().enumerate() {
            require(&format!("projects[{i}].name"), &item.name)?;
        }
        for (i, item) in self.certifications.iter().enumerate() {
            require(&format!("certifications[{i}].name"), &item.name)?;
            require(&format!("certifications[{i}].issuer"), &item.issuer)?;
        }
        for (i, item) in self.languages.iter().enumerate() {
            require(&format!("languages[{i}].name"), &item.name)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("required field '{field}' is empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_content() -> GeneratedCvContent {
        GeneratedCvContent {
            section_titles: SectionTitles {
                professional_summary: "Profile".into(),
                work_experience: "Experience".into(),
                education: "Education".into(),
                skills: "Skills".into(),
                projects: "Projects".into(),
                certifications: "Certifications".into(),
                languages: "Languages".into(),
            },
            professional_summary: "Backend engineer with six years of Rust and Go.".into(),
            work_experience: vec![WorkExperienceItem {
                company: "Ferrous Labs".into(),
                position: "Senior Engineer".into(),
                location: Some("Berlin".into()),
                start_date: "2021-03".into(),
                end_date: None,
                description: "Owned the billing pipeline.".into(),
                achievements: vec!["Cut invoice latency by 40%".into()],
            }],
            education: vec![EducationItem {
                institution: "TU Munich".into(),
                degree: "MSc".into(),
                field_of_study: Some("Informatics".into()),
                start_date: "2015-10".into(),
                end_date: Some("2017-09".into()),
                gpa: Some(1.3),
                description: None,
            }],
            skills: vec![
                SkillItem {
                    name: "Rust".into(),
                    category: Some("Programming Languages".into()),
                    proficiency_level: Some("Expert".into()),
                },
                SkillItem {
                    name: "PostgreSQL".into(),
                    category: Some("Databases".into()),
                    proficiency_level: None,
                },
            ],
            projects: vec![],
            certifications: vec![],
            languages: vec![LanguageItem {
                name: "German".into(),
                proficiency: Some("Native".into()),
            }],
        }
    }
}
