//! Promising Classifier: one holistic verdict per candidate, issued after all
//! of that candidate's requirement matches are known.

use tracing::debug;

use crate::catalog::ScoreBounds;
use crate::errors::ScreeningError;
use crate::llm_client::payload::parse_payload;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::AnswerEngine;
use crate::matching::prompts::PROMISING_PROMPT_TEMPLATE;
use crate::models::screening::{PromisingResult, RequirementMatches};

/// Classifies a candidate from their completed requirement matches.
///
/// Malformed or incomplete verdicts are hard failures: an unclassified
/// candidate is never defaulted to either side.
pub async fn classify_candidate(
    engine: &dyn AnswerEngine,
    bounds: &ScoreBounds,
    requirement_matches: &RequirementMatches,
) -> Result<PromisingResult, ScreeningError> {
    let prompt = build_promising_prompt(bounds, requirement_matches)?;
    let answer = engine.submit(&prompt).await?;
    let result: PromisingResult = parse_payload(&answer).into_typed("promising result")?;
    debug!("Candidate classified promising={}", result.promising);
    Ok(result)
}

fn build_promising_prompt(
    bounds: &ScoreBounds,
    requirement_matches: &RequirementMatches,
) -> Result<String, ScreeningError> {
    let matches_json = serde_json::to_string_pretty(requirement_matches).map_err(|e| {
        ScreeningError::SchemaViolation(format!("requirement matches not serializable: {e}"))
    })?;

    Ok(PROMISING_PROMPT_TEMPLATE
        .replace("{min_score}", &bounds.min.to_string())
        .replace("{max_score}", &bounds.max.to_string())
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{requirement_matches}", &matches_json))
}
