use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::models::evaluation::{HumanMatchingResult, ModelMatchingResult};

/// Survey export: every human submission across all jobs.
#[derive(Debug, Deserialize)]
pub struct SurveyExport {
    pub submissions: Vec<HumanMatchingResult>,
}

/// Output of `screener score`; only the model results are read back.
#[derive(Debug, Deserialize)]
pub struct ModelResultsFile {
    pub model_results: Vec<ModelMatchingResult>,
}

pub async fn load_survey(path: &Path) -> Result<SurveyExport> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read survey export {}", path.display()))?;
    let survey: SurveyExport = serde_json::from_str(&raw)
        .with_context(|| format!("Survey export {} is not valid", path.display()))?;
    info!("Loaded {} human submissions", survey.submissions.len());
    Ok(survey)
}

pub async fn load_model_results(path: &Path) -> Result<BTreeMap<String, ModelMatchingResult>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read model results {}", path.display()))?;
    let file: ModelResultsFile = serde_json::from_str(&raw)
        .with_context(|| format!("Model results {} are not valid", path.display()))?;
    Ok(file
        .model_results
        .into_iter()
        .map(|result| (result.job_id.clone(), result))
        .collect())
}

/// Submissions grouped per job, each group in export order.
pub fn group_by_job(
    submissions: Vec<HumanMatchingResult>,
) -> BTreeMap<String, Vec<HumanMatchingResult>> {
    let mut groups: BTreeMap<String, Vec<HumanMatchingResult>> = BTreeMap::new();
    for submission in submissions {
        groups
            .entry(submission.job_id.clone())
            .or_default()
            .push(submission);
    }
    groups
}
