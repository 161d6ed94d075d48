//! Requirement Matcher: one judgment request per (requirement, candidate) pair.

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{RequirementCategory, ScoreBounds};
use crate::errors::ScreeningError;
use crate::llm_client::payload::parse_payload;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::AnswerEngine;
use crate::matching::prompts::MATCH_PROMPT_TEMPLATE;
use crate::models::screening::{Requirement, RequirementKind, RequirementMatch, Score};

/// Shape of the engine's per-requirement payload before clamping.
#[derive(Debug, Deserialize)]
struct RawScore {
    value: f64,
    explanation: String,
}

/// Produces exactly one `RequirementMatch` for `requirement` against `cv_text`.
///
/// The judged value is clamped into `bounds`: the generator is not bound to the
/// requested range, so out-of-range values are pulled in rather than rejected.
pub async fn match_requirement(
    engine: &dyn AnswerEngine,
    bounds: &ScoreBounds,
    cv_text: &str,
    category: RequirementCategory,
    requirement: &Requirement,
) -> Result<RequirementMatch, ScreeningError> {
    let prompt = build_match_prompt(bounds, cv_text, category, requirement);
    let answer = engine.submit(&prompt).await?;
    let score = score_from_answer(bounds, &answer)?;

    debug!(
        "Matched {category} requirement '{}' → {}",
        requirement.specification, score.value
    );

    Ok(RequirementMatch {
        score,
        requirement: requirement.clone(),
    })
}

fn score_from_answer(bounds: &ScoreBounds, answer: &str) -> Result<Score, ScreeningError> {
    let raw: RawScore = parse_payload(answer).into_typed("requirement score")?;
    if !raw.value.is_finite() {
        return Err(ScreeningError::SchemaViolation(
            "requirement score value must be a finite number".to_string(),
        ));
    }
    Ok(Score::clamped(raw.value, &raw.explanation, bounds))
}

pub(crate) fn build_match_prompt(
    bounds: &ScoreBounds,
    cv_text: &str,
    category: RequirementCategory,
    requirement: &Requirement,
) -> String {
    let kind = match requirement.kind {
        RequirementKind::Mandatory => "mandatory",
        RequirementKind::Optional => "optional",
    };

    MATCH_PROMPT_TEMPLATE
        .replace("{category_name}", category.as_str())
        .replace("{category_definition}", category.definition())
        .replace("{requirement_type}", kind)
        .replace("{min_score}", &bounds.min.to_string())
        .replace("{max_score}", &bounds.max.to_string())
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        // untrusted text last so its braces are never expanded
        .replace("{requirement_specification}", &requirement.specification)
        .replace("{cv_text}", cv_text.trim())
}
