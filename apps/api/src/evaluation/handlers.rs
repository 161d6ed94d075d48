use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::evaluation::report::{evaluate_job, JobEvaluation};
use crate::models::evaluation::{HumanMatchingResult, ModelMatchingResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub human_results: Vec<HumanMatchingResult>,
    pub model_result: ModelMatchingResult,
}

/// POST /api/v1/evaluate
/// Reconciles the human submissions of one job and scores the model against them.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<JobEvaluation>, AppError> {
    let job_id = req.model_result.job_id.clone();
    let evaluation = evaluate_job(
        &job_id,
        &req.human_results,
        &req.model_result,
        state.config.panel_size,
    )?;
    Ok(Json(evaluation))
}
