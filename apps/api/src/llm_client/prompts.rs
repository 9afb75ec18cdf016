// Shared prompt fragments used by every LLM call.
// Each feature that calls the LLM defines its own prompts alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with exactly one valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Non-hallucination rule appended to every CV prompt.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY facts present in the candidate data below. \
    Do NOT invent employers, dates, degrees, certifications, metrics, projects or skills. \
    You may rephrase and reorder, but every statement must be traceable to the input. \
    If a section has no source data, return an empty array for it.";
