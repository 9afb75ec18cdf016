//! Prompt Builder — turns a profile snapshot, optional job posting and style options
//! into the instruction text for the CV generation call.
//!
//! Pure and deterministic: the same inputs always produce the same text.

use chrono::NaiveDate;

use crate::generation::prompts::{
    CV_OUTPUT_RULES, CV_OUTPUT_SCHEMA, JOB_BASED_PROMPT_TEMPLATE, PROFILE_BASED_PROMPT_TEMPLATE,
};
use crate::generation::tone::tone_guidance;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::models::profile::{JobPostingRow, ProfileSnapshot};

/// Content language used when the request does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Builds the generation instruction. A job posting selects the tailored branch.
pub fn build_prompt(
    profile: &ProfileSnapshot,
    job_posting: Option<&JobPostingRow>,
    tone: &str,
    language: &str,
) -> String {
    let language = language_name(language);
    let output_rules = fill_placeholders(
        CV_OUTPUT_RULES,
        &[
            ("no_invention_instruction", NO_INVENTION_INSTRUCTION),
            ("language", language.as_str()),
        ],
    );
    let tone_text = tone_guidance(tone).to_prompt_text();

    let template = match job_posting {
        Some(_) => JOB_BASED_PROMPT_TEMPLATE,
        None => PROFILE_BASED_PROMPT_TEMPLATE,
    };

    let job_block = job_posting.map(render_job_block).unwrap_or_default();
    let profile_block = render_profile_block(profile);

    fill_placeholders(
        template,
        &[
            ("output_rules", output_rules.as_str()),
            ("output_schema", CV_OUTPUT_SCHEMA),
            ("language", language.as_str()),
            ("tone_text", tone_text.as_str()),
            ("job_block", job_block.as_str()),
            ("profile_block", profile_block.as_str()),
        ],
    )
}

/// Replaces `{name}` placeholders in one left-to-right pass. Substituted values are
/// copied verbatim and never scanned again; unknown `{...}` text is kept as is.
pub(crate) fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Human-readable language name for a content-language code. Unknown codes pass through.
pub fn language_name(code: &str) -> String {
    let code = code.trim();
    let name = match code.to_lowercase().as_str() {
        "" | "en" => "English",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "tr" => "Turkish",
        "pl" => "Polish",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// Job posting as prompt text.
pub fn render_job_block(job: &JobPostingRow) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", job.title));
    push_opt(&mut out, "Company", job.company.as_deref());
    push_opt(&mut out, "Location", job.location.as_deref());
    push_opt(&mut out, "Experience level", job.experience_level.as_deref());
    if !job.required_skills.is_empty() {
        out.push_str(&format!("Required skills: {}\n", job.required_skills.join(", ")));
    }
    if !job.keywords.is_empty() {
        out.push_str(&format!("Keywords: {}\n", job.keywords.join(", ")));
    }
    out.push_str(&format!("Description:\n{}\n", job.description.trim()));
    out
}

/// Full profile as prompt text, sections in a fixed order.
pub fn render_profile_block(snapshot: &ProfileSnapshot) -> String {
    let p = &snapshot.profile;
    let mut out = String::new();

    out.push_str(&format!("Name: {}\n", p.full_name));
    push_opt(&mut out, "Headline", p.headline.as_deref());
    push_opt(&mut out, "Location", p.location.as_deref());
    push_opt(&mut out, "Existing summary", p.summary.as_deref());

    out.push_str("\nWORK EXPERIENCE:\n");
    if snapshot.experiences.is_empty() {
        out.push_str("(none)\n");
    }
    for exp in &snapshot.experiences {
        let end = if exp.is_current {
            "present".to_string()
        } else {
            fmt_date(exp.end_date)
        };
        out.push_str(&format!(
            "- {} at {} ({} to {})\n",
            exp.position,
            exp.company,
            fmt_date(exp.start_date),
            end
        ));
        push_indented(&mut out, "Location", exp.location.as_deref());
        push_indented(&mut out, "Description", exp.description.as_deref());
        for achievement in &exp.achievements {
            out.push_str(&format!("  * {achievement}\n"));
        }
    }

    out.push_str("\nEDUCATION:\n");
    if snapshot.education.is_empty() {
        out.push_str("(none)\n");
    }
    for edu in &snapshot.education {
        let field = edu
            .field_of_study
            .as_deref()
            .map(|f| format!(" in {f}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "- {}{} at {} ({} to {})\n",
            edu.degree,
            field,
            edu.institution,
            fmt_date(edu.start_date),
            fmt_date(edu.end_date)
        ));
        if let Some(gpa) = edu.gpa {
            out.push_str(&format!("  GPA: {gpa}\n"));
        }
        push_indented(&mut out, "Description", edu.description.as_deref());
    }

    out.push_str("\nSKILLS:\n");
    if snapshot.skills.is_empty() {
        out.push_str("(none)\n");
    }
    for skill in &snapshot.skills {
        let mut line = format!("- {}", skill.name);
        if let Some(category) = &skill.category {
            line.push_str(&format!(" [category: {category}]"));
        }
        if let Some(level) = &skill.proficiency_level {
            line.push_str(&format!(" [level: {level}]"));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str("\nPROJECTS:\n");
    if snapshot.projects.is_empty() {
        out.push_str("(none)\n");
    }
    for project in &snapshot.projects {
        out.push_str(&format!("- {}\n", project.name));
        push_indented(&mut out, "Description", project.description.as_deref());
        if !project.technologies.is_empty() {
            out.push_str(&format!("  Technologies: {}\n", project.technologies.join(", ")));
        }
        push_indented(&mut out, "URL", project.url.as_deref());
        push_indented(&mut out, "GitHub", project.github_url.as_deref());
    }

    out.push_str("\nCERTIFICATIONS:\n");
    if snapshot.certifications.is_empty() {
        out.push_str("(none)\n");
    }
    for cert in &snapshot.certifications {
        out.push_str(&format!(
            "- {} by {} (issued {}",
            cert.name,
            cert.issuer,
            fmt_date(cert.issue_date)
        ));
        if let Some(expiry) = cert.expiry_date {
            out.push_str(&format!(", expires {}", expiry.format("%Y-%m")));
        }
        out.push_str(")\n");
    }

    out.push_str("\nLANGUAGES:\n");
    if snapshot.languages.is_empty() {
        out.push_str("(none)\n");
    }
    for lang in &snapshot.languages {
        match &lang.proficiency {
            Some(level) => out.push_str(&format!("- {} ({level})\n", lang.name)),
            None => out.push_str(&format!("- {}\n", lang.name)),
        }
    }

    out
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn push_opt(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        out.push_str(&format!("{label}: {}\n", v.trim()));
    }
}

fn push_indented(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        out.push_str(&format!("  {label}: {}\n", v.trim()));
    }
}
