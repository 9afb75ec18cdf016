//! Job analysis — extracts skills, keywords and expectations from a job posting and,
//! when a profile is supplied, a match assessment.
//!
//! Advisory only: callers always get a `JobAnalysis`, empty when the LLM call fails.

use serde::{Deserialize, Serialize};

use crate::generation::prompt_builder::{
    fill_placeholders, render_job_block, render_profile_block,
};
use crate::generation::prompts::JOB_ANALYSIS_PROMPT_TEMPLATE;
use crate::models::profile::{JobPostingRow, ProfileSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAnalysis {
    pub match_percentage: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalysis {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub experience_level: String,
    pub keywords: Vec<String>,
    pub role_expectations: Vec<String>,
    pub match_analysis: Option<MatchAnalysis>,
}

impl JobAnalysis {
    /// The degraded result returned when analysis is unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Clamps the match percentage and drops a match block nobody asked for.
    pub fn normalized(mut self, with_profile: bool) -> Self {
        if !with_profile {
            self.match_analysis = None;
        }
        if let Some(m) = self.match_analysis.as_mut() {
            m.match_percentage = if m.match_percentage.is_finite() {
                m.match_percentage.clamp(0.0, 100.0)
            } else {
                0.0
            };
        }
        self
    }
}

/// Builds the analysis instruction. The profile section is empty without a profile.
pub fn build_analysis_prompt(job: &JobPostingRow, profile: Option<&ProfileSnapshot>) -> String {
    let profile_section = profile
        .map(|p| format!("\nCANDIDATE DATA:\n{}", render_profile_block(p)))
        .unwrap_or_default();

    let job_block = render_job_block(job);

    fill_placeholders(
        JOB_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_block", job_block.as_str()),
            ("profile_section", profile_section.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_job_posting, sample_profile};
    use uuid::Uuid;

    #[test]
    fn test_empty_analysis_has_no_data_and_no_match() {
        let empty = JobAnalysis::empty();
        assert!(empty.technical_skills.is_empty());
        assert!(empty.keywords.is_empty());
        assert_eq!(empty.experience_level, "");
        assert!(empty.match_analysis.is_none());

        let value = serde_json::to_value(&empty).unwrap();
        assert!(value["matchAnalysis"].is_null());
        assert_eq!(value["roleExpectations"], serde_json::json!([]));
    }

    #[test]
    fn test_analysis_with_match_block_decodes() {
        let json = r#"{
            "technicalSkills": ["Rust", "Kafka"],
            "softSkills": ["Ownership"],
            "experienceLevel": "Senior",
            "keywords": ["event sourcing"],
            "roleExpectations": ["Own the ingestion pipeline"],
            "matchAnalysis": {
                "matchPercentage": 72,
                "matchingSkills": ["Rust"],
                "missingSkills": ["Kafka"],
                "strengths": ["Billing systems"],
                "gaps": ["No streaming experience"]
            }
        }"#;
        let analysis: JobAnalysis = serde_json::from_str(json).unwrap();
        let m = analysis.match_analysis.unwrap();
        assert_eq!(m.match_percentage, 72.0);
        assert_eq!(m.missing_skills, vec!["Kafka"]);
    }

    #[test]
    fn test_match_percentage_is_clamped() {
        let analysis = JobAnalysis {
            match_analysis: Some(MatchAnalysis {
                match_percentage: 140.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let normalized = analysis.normalized(true);
        assert_eq!(normalized.match_analysis.unwrap().match_percentage, 100.0);
    }

    #[test]
    fn test_match_block_dropped_without_profile() {
        let analysis = JobAnalysis {
            match_analysis: Some(MatchAnalysis::default()),
            ..Default::default()
        };
        assert!(analysis.normalized(false).match_analysis.is_none());
    }

    #[test]
    fn test_prompt_includes_candidate_only_when_given() {
        let user = Uuid::new_v4();
        let job = sample_job_posting(user);
        let profile = sample_profile(user);

        let without = build_analysis_prompt(&job, None);
        assert!(without.contains("Title: Staff Backend Engineer"));
        assert!(!without.contains("CANDIDATE DATA:\n"));

        let with = build_analysis_prompt(&job, Some(&profile));
        assert!(with.contains("CANDIDATE DATA:\nName: Ada Example"));
    }
}
