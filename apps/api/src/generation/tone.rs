//! Tone calibration — maps the free-form tone label on a request to writing guidance.
//!
//! The label itself is recorded verbatim on the record; only the prompt uses this mapping.

/// Tone used when the request does not name one.
pub const DEFAULT_TONE: &str = "Professional";

/// Writing guidance for a tone label. Matching ignores case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneGuidance {
    pub label: String,
    pub style: &'static str,
    pub preferred_verbs: &'static [&'static str],
}

const GENERIC_STYLE: &str = "Write in the requested tone while staying factual and concise.";

const PROFESSIONAL_VERBS: &[&str] = &["Led", "Delivered", "Managed", "Improved", "Implemented"];
const CREATIVE_VERBS: &[&str] = &["Crafted", "Designed", "Reimagined", "Launched", "Shaped"];
const TECHNICAL_VERBS: &[&str] = &["Architected", "Optimized", "Automated", "Engineered", "Migrated"];
const EXECUTIVE_VERBS: &[&str] = &["Directed", "Spearheaded", "Scaled", "Transformed", "Championed"];
const FRIENDLY_VERBS: &[&str] = &["Collaborated", "Supported", "Helped launch", "Partnered", "Mentored"];
const ACADEMIC_VERBS: &[&str] = &["Investigated", "Published", "Analyzed", "Evaluated", "Presented"];
const NO_VERBS: &[&str] = &[];

/// Resolves a tone label. Unknown labels are kept verbatim with generic guidance.
pub fn tone_guidance(label: &str) -> ToneGuidance {
    let label = label.trim();
    let label = if label.is_empty() { DEFAULT_TONE } else { label };

    let (style, preferred_verbs) = match label.to_lowercase().as_str() {
        "professional" => (
            "Formal, confident and concise. Lead with outcomes and scope.",
            PROFESSIONAL_VERBS,
        ),
        "creative" => (
            "Warm and distinctive, with vivid but accurate wording. Show personality without slang.",
            CREATIVE_VERBS,
        ),
        "technical" => (
            "Precise and technical. Name technologies, architectures and measurable engineering results.",
            TECHNICAL_VERBS,
        ),
        "executive" => (
            "Strategic and high-level. Emphasize leadership, business impact and decision scope.",
            EXECUTIVE_VERBS,
        ),
        "friendly" => (
            "Approachable and positive while remaining professional. Highlight collaboration.",
            FRIENDLY_VERBS,
        ),
        "academic" => (
            "Scholarly and evidence-based. Emphasize research, publications and methodology.",
            ACADEMIC_VERBS,
        ),
        _ => (GENERIC_STYLE, NO_VERBS),
    };

    ToneGuidance {
        label: label.to_string(),
        style,
        preferred_verbs,
    }
}

impl ToneGuidance {
    /// One prompt paragraph describing the tone.
    pub fn to_prompt_text(&self) -> String {
        let mut text = format!("Tone: {}. {}", self.label, self.style);
        if !self.preferred_verbs.is_empty() {
            text.push_str(&format!(
                " Prefer action verbs such as: {}.",
                self.preferred_verbs.join(", ")
            ));
        }
        text
    }
}
