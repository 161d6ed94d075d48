// Prompt templates for extraction, per-requirement matching and the holistic
// promising check. Placeholders in `{braces}` are replaced before sending.

/// Requirement extraction. Replace `{empty_requirements}`, `{category_definitions}`,
/// `{sample_requirement}`, `{job_text}` and `{json_only}`.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the job requirements from the job description below.

Fill the requirements into the arrays of this JSON object (one key per category):
{empty_requirements}

What belongs into each category:
{category_definitions}

Every requirement is an object with this EXACT schema:
{sample_requirement}
"type" is either "mandatory" or "optional". A category with no suitable requirement keeps an
empty array. All requirements must be unique.

JOB DESCRIPTION:
{job_text}

{json_only}"#;

/// Per-requirement judgment. Replace `{category_name}`, `{category_definition}`,
/// `{requirement_type}`, `{requirement_specification}`, `{min_score}`, `{max_score}`,
/// `{cv_text}` and `{json_only}`.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Judge how well the applicant's CV satisfies ONE job requirement.

REQUIREMENT CATEGORY: {category_name}
CATEGORY MEANING: {category_definition}
REQUIREMENT ({requirement_type}): {requirement_specification}

Rate the fulfilment between {min_score} (not fulfilled at all) and {max_score} (fully
fulfilled) and explain the rating in one or two sentences, citing the CV.

Return a JSON object with this EXACT schema:
{"value": <number between {min_score} and {max_score}>, "explanation": "<why>"}

APPLICANT CV:
{cv_text}

{json_only}"#;

/// Holistic verdict. Replace `{requirement_matches}`, `{min_score}`, `{max_score}`
/// and `{json_only}`.
pub const PROMISING_PROMPT_TEMPLATE: &str = r#"Below are per-requirement ratings of one applicant against a job, grouped by
requirement category. Ratings range from {min_score} to {max_score}; mandatory
requirements weigh more than optional ones.

{requirement_matches}

Decide whether the applicant is promising enough to be invited to the next round.

Return a JSON object with this EXACT schema:
{"promising": <true or false>, "explanation": "<why, in two or three sentences>"}

{json_only}"#;
