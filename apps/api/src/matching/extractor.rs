//! Requirement Extractor: turns a raw job description into requirements per category.

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::catalog::{RequirementCategory, RunContext};
use crate::errors::ScreeningError;
use crate::llm_client::payload::parse_payload;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::AnswerEngine;
use crate::matching::prompts::EXTRACTION_PROMPT_TEMPLATE;
use crate::models::screening::{Requirement, RequirementsByCategory};

/// Extracts requirements with a single engine call.
///
/// Every configured category is present in the result, possibly empty.
/// Unknown categories, non-array values and non-object items are skipped;
/// an object that is not a valid `Requirement` is a schema violation.
pub async fn extract_requirements(
    engine: &dyn AnswerEngine,
    ctx: &RunContext,
    job_text: &str,
) -> Result<RequirementsByCategory, ScreeningError> {
    let prompt = build_extraction_prompt(ctx, job_text);
    let answer = engine.submit(&prompt).await?;
    let requirements = requirements_from_answer(ctx, &answer)?;

    info!(
        "Extracted {} requirements across {} categories",
        requirements.values().map(Vec::len).sum::<usize>(),
        requirements.values().filter(|r| !r.is_empty()).count()
    );
    Ok(requirements)
}

fn requirements_from_answer(
    ctx: &RunContext,
    answer: &str,
) -> Result<RequirementsByCategory, ScreeningError> {
    let value = parse_payload(answer).into_value()?;
    let object = value.as_object().ok_or_else(|| {
        ScreeningError::SchemaViolation("requirements payload must be an object".to_string())
    })?;

    let mut requirements: RequirementsByCategory = ctx
        .weighting
        .categories()
        .map(|category| (category, Vec::new()))
        .collect();

    for (key, items) in object {
        let Ok(category) = key.parse::<RequirementCategory>() else {
            debug!("Skipping unknown requirement category '{key}'");
            continue;
        };
        let Some(bucket) = requirements.get_mut(&category) else {
            debug!("Skipping unconfigured requirement category '{category}'");
            continue;
        };
        let Some(items) = items.as_array() else {
            debug!("Skipping non-array requirements for '{category}'");
            continue;
        };

        for item in items.iter().filter(|i| i.is_object()) {
            let requirement: Requirement = serde_json::from_value(item.clone()).map_err(|e| {
                ScreeningError::SchemaViolation(format!("invalid {category} requirement: {e}"))
            })?;
            if bucket.contains(&requirement) {
                debug!("Dropping duplicate {category} requirement '{}'", requirement.specification);
                continue;
            }
            bucket.push(requirement);
        }
    }

    Ok(requirements)
}

fn build_extraction_prompt(ctx: &RunContext, job_text: &str) -> String {
    let empty: Map<String, Value> = ctx
        .weighting
        .categories()
        .map(|c| (c.as_str().to_string(), json!([])))
        .collect();
    let definitions: Map<String, Value> = ctx
        .weighting
        .categories()
        .map(|c| (c.as_str().to_string(), json!(c.definition())))
        .collect();
    let sample = json!({
        "type": "mandatory",
        "specification": "Here should stand the specification text of the requirement"
    });

    EXTRACTION_PROMPT_TEMPLATE
        .replace("{empty_requirements}", &Value::Object(empty).to_string())
        .replace("{category_definitions}", &Value::Object(definitions).to_string())
        .replace("{sample_requirement}", &sample.to_string())
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{job_text}", job_text.trim())
}
