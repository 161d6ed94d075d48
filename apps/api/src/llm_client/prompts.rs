// Cross-cutting prompt fragments shared by every judgment request.
// Task-specific templates live in matching::prompts.

/// System prompt sent with every answer-engine call.
pub const SCREENING_SYSTEM: &str = "You are a meticulous recruiting assistant who screens \
    job applicants strictly on the evidence in their CV. \
    You MUST answer with a single JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT invent qualifications the CV does not state.";

/// Appended to every prompt that expects a structured payload.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with exactly one JSON object matching the schema above. \
    Do not wrap it in markdown and do not add commentary.";
