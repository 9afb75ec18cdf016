//! Fixed template registry and Handlebars compilation.
//!
//! Every template shares the same partials (header, sections, page CSS) and differs
//! only in layout and styling. Page geometry lives in `base.css.hbs`: A4, zero
//! margins, backgrounds printed exactly as on screen.

use handlebars::Handlebars;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::user::SubscriptionType;

pub const DEFAULT_TEMPLATE: &str = "modern";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_premium: bool,
    #[serde(skip)]
    source: &'static str,
}

pub const TEMPLATES: &[TemplateInfo] = &[
    TemplateInfo {
        id: "modern",
        name: "Modern",
        description: "Bold colour header with a clean single-column body",
        is_premium: false,
        source: include_str!("../../templates/modern.hbs"),
    },
    TemplateInfo {
        id: "classic",
        name: "Classic",
        description: "Serif typography with ruled section headings",
        is_premium: false,
        source: include_str!("../../templates/classic.hbs"),
    },
    TemplateInfo {
        id: "minimal",
        name: "Minimal",
        description: "Generous whitespace and understated headings",
        is_premium: false,
        source: include_str!("../../templates/minimal.hbs"),
    },
    TemplateInfo {
        id: "executive",
        name: "Executive",
        description: "Small-caps headings with a gold accent for senior roles",
        is_premium: true,
        source: include_str!("../../templates/executive.hbs"),
    },
    TemplateInfo {
        id: "creative",
        name: "Creative",
        description: "Two columns with a coloured sidebar for contact and skills",
        is_premium: true,
        source: include_str!("../../templates/creative.hbs"),
    },
];

const PARTIALS: &[(&str, &str)] = &[
    ("base_css", include_str!("../../templates/base.css.hbs")),
    ("header", include_str!("../../templates/header.hbs")),
    ("summary", include_str!("../../templates/summary.hbs")),
    ("experience", include_str!("../../templates/experience.hbs")),
    ("education", include_str!("../../templates/education.hbs")),
    ("skills", include_str!("../../templates/skills.hbs")),
    ("extras", include_str!("../../templates/extras.hbs")),
];

pub fn find_template(id: &str) -> Option<&'static TemplateInfo> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Looks up a template, failing with `Validation` for unknown ids.
pub fn require_template(id: &str) -> Result<&'static TemplateInfo, AppError> {
    find_template(id).ok_or_else(|| {
        let known: Vec<&str> = TEMPLATES.iter().map(|t| t.id).collect();
        AppError::Validation(format!(
            "Unknown template '{id}'. Available templates: {}",
            known.join(", ")
        ))
    })
}

/// Premium templates need an effective PRO plan.
pub fn check_template_access(
    template: &TemplateInfo,
    plan: SubscriptionType,
) -> Result<(), AppError> {
    if template.is_premium && plan != SubscriptionType::Pro {
        return Err(AppError::Forbidden(format!(
            "Template '{}' requires a PRO subscription",
            template.id
        )));
    }
    Ok(())
}

/// Compiles every registered template and partial.
pub fn build_registry() -> Result<Handlebars<'static>, AppError> {
    let mut registry = Handlebars::new();
    for (name, source) in PARTIALS {
        registry
            .register_partial(name, *source)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("partial '{name}': {e}")))?;
    }
    for template in TEMPLATES {
        registry
            .register_template_string(template.id, template.source)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("template '{}': {e}", template.id)))?;
    }
    Ok(registry)
}
