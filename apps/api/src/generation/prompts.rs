// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for CV generation — enforces JSON-only output.
pub const CV_GENERATION_SYSTEM: &str = "You are an expert CV writer and career coach. \
    You turn verified candidate data into a polished, tailored CV. \
    You MUST respond with exactly one valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent facts not present in the candidate data.";

/// Exact output structure required from every CV generation call.
pub const CV_OUTPUT_SCHEMA: &str = r#"{
  "sectionTitles": {
    "professionalSummary": "string",
    "workExperience": "string",
    "education": "string",
    "skills": "string",
    "projects": "string",
    "certifications": "string",
    "languages": "string"
  },
  "professionalSummary": "string",
  "workExperience": [
    {
      "company": "string",
      "position": "string",
      "location": "string or null",
      "startDate": "YYYY-MM",
      "endDate": "YYYY-MM or null if current",
      "description": "string",
      "achievements": ["string"]
    }
  ],
  "education": [
    {
      "institution": "string",
      "degree": "string",
      "fieldOfStudy": "string or null",
      "startDate": "YYYY-MM",
      "endDate": "YYYY-MM or null",
      "gpa": "number or null",
      "description": "string or null"
    }
  ],
  "skills": [
    { "name": "string", "category": "string", "proficiencyLevel": "string or null" }
  ],
  "projects": [
    {
      "name": "string",
      "description": "string or null",
      "technologies": ["string"],
      "url": "string or null",
      "githubUrl": "string or null"
    }
  ],
  "certifications": [
    { "name": "string", "issuer": "string", "issueDate": "YYYY-MM", "expiryDate": "YYYY-MM or null" }
  ],
  "languages": [
    { "name": "string", "proficiency": "string or null" }
  ]
}"#;

/// Output rules shared by both prompt branches.
/// Replace: {no_invention_instruction}, {language}
pub const CV_OUTPUT_RULES: &str = r#"OUTPUT RULES (all mandatory):
1. Respond with ONE JSON object only. No prose, no markdown, no code fences.
2. Follow the OUTPUT STRUCTURE exactly: every key shown must be present, arrays may be empty, use null for unknown optional values.
3. {no_invention_instruction}
4. Write EVERY human-readable string in {language}, including all sectionTitles labels, the summary, descriptions, achievements, skill categories and proficiency labels. Translate source data written in another language. Keep proper names (companies, institutions, products, technologies) unchanged.
5. Give every skill a specific, meaningful category (for example "Programming Languages", "Cloud & DevOps", "Databases", "Soft Skills"), written in {language}. Never use a generic bucket such as "Other" or "General".
6. Dates use the YYYY-MM format. Keep the chronology of the source data."#;

/// Job-based branch. Replace: {tone_text}, {language}, {job_block}, {profile_block},
/// {output_rules}, {output_schema}
pub const JOB_BASED_PROMPT_TEMPLATE: &str = r#"Create a CV tailored to the target job below.

{tone_text}
Output language: {language}

TARGET JOB:
{job_block}

CANDIDATE DATA (source of truth — ONLY use facts from here):
{profile_block}

TAILORING INSTRUCTIONS:
- Write the professional summary as a fit narrative: explain in 3-5 sentences why this candidate suits this role at this company, citing only real experience.
- Order work experience achievements so those most relevant to the job title, experience level and required skills come first.
- Use the job's required skills and keywords naturally where the candidate data supports them. Never claim a required skill the candidate does not have.
- Put the skills that match the job's requirements first within their categories.
- Keep projects and certifications that support the role; you may drop clearly irrelevant ones, but never add new ones.

{output_rules}

OUTPUT STRUCTURE:
{output_schema}"#;

/// Profile-based branch. Replace: {tone_text}, {language}, {profile_block},
/// {output_rules}, {output_schema}
pub const PROFILE_BASED_PROMPT_TEMPLATE: &str = r#"Create a comprehensive, general-purpose CV from the candidate's full profile.

{tone_text}
Output language: {language}

CANDIDATE DATA (source of truth — ONLY use facts from here):
{profile_block}

WRITING INSTRUCTIONS:
- Write the professional summary as a 3-5 sentence narrative of the candidate's overall career, strengths and direction.
- Cover the whole profile: include every work experience, education entry, project, certification and language.
- Turn descriptions into clear achievement statements, keeping any numbers exactly as given.
- Group skills into meaningful categories.

{output_rules}

OUTPUT STRUCTURE:
{output_schema}"#;

/// System prompt for job analysis — enforces JSON-only output.
pub const JOB_ANALYSIS_SYSTEM: &str = "You are an expert recruiter and job description analyst. \
    You MUST respond with exactly one valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job analysis prompt. Replace: {job_block}, {profile_section}
pub const JOB_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the job posting below.

JOB POSTING:
{job_block}
{profile_section}
Return a JSON object with this EXACT structure:
{
  "technicalSkills": ["string"],
  "softSkills": ["string"],
  "experienceLevel": "string",
  "keywords": ["string"],
  "roleExpectations": ["string"],
  "matchAnalysis": null
}

When CANDIDATE DATA is provided, replace null in "matchAnalysis" with:
{
  "matchPercentage": 0-100,
  "matchingSkills": ["string"],
  "missingSkills": ["string"],
  "strengths": ["string"],
  "gaps": ["string"]
}
Base the match only on the candidate data given. Keep "matchAnalysis" null when no candidate data is provided."#;
