//! Job-level evaluation of the model against the human baseline, and the
//! cross-job report built from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ScreeningError;
use crate::evaluation::comparison::{compare_entities, mean_comparison, EntityComparison};
use crate::evaluation::metrics::{
    better_or_equal_percentage, candidates_filtered, error_result, filter_accuracy, mean,
    time_savings_ratio, Polarity,
};
use crate::evaluation::reconciler::reconcile_humans;
use crate::models::evaluation::{
    ConsensusHumanResult, ErrorResult, HumanErrorResult, HumanMatchingResult, ModelMatchingResult,
};

/// Error result averaged over several parties or jobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanErrorResult {
    pub hamming_distance: f64,
    pub rank_correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Share of humans whose rank correlation the model matches or beats.
    pub ranking_better_or_equal_than_human: f64,
    /// Share of humans whose shortlist distance the model matches or beats.
    pub categorization_better_or_equal_than_human: f64,
    pub time_savings_ratio: f64,
    pub candidates_filtered: f64,
    pub filter_accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanMetrics {
    /// Mean over submitters of `K − |shortlist|`.
    pub candidates_filtered: f64,
    pub filter_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvaluation {
    pub job_id: String,
    pub consensus: ConsensusHumanResult,
    pub human_error_results: Vec<HumanErrorResult>,
    pub mean_human_error_result: MeanErrorResult,
    pub model_result: ModelMatchingResult,
    pub model_error_result: ErrorResult,
    pub model_metrics: ModelMetrics,
    pub human_metrics: HumanMetrics,
    pub entity_comparison: EntityComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMetrics {
    pub jobs_evaluated: usize,
    pub human_error_result: MeanErrorResult,
    pub model_error_result: MeanErrorResult,
    pub model_metrics: ModelMetrics,
    pub human_metrics: HumanMetrics,
    /// Cell-wise mean of the per-job tables; `None` unless every job was
    /// screened by the same entities.
    pub entity_comparison: Option<EntityComparison>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobEvaluationOutcome {
    Evaluated(JobEvaluation),
    Failed { job_id: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub panel_size: usize,
    pub jobs: Vec<JobEvaluationOutcome>,
    /// `None` when no job could be evaluated.
    pub merged: Option<MergedMetrics>,
}

/// Compares every human submission and the model result against the consensus.
pub fn evaluate(
    consensus: &ConsensusHumanResult,
    human_results: &[HumanMatchingResult],
    model_result: &ModelMatchingResult,
) -> Result<JobEvaluation, ScreeningError> {
    let all_candidates = consensus.ranking.candidates();
    model_result.validate(consensus.ranking.len())?;

    let human_error_results = human_results
        .iter()
        .map(|human| {
            Ok(HumanErrorResult {
                submitter_id: human.submitter_id,
                error: error_result(
                    &consensus.shortlisted,
                    &consensus.ranking,
                    &human.shortlisted,
                    &human.ranking,
                )?,
            })
        })
        .collect::<Result<Vec<_>, ScreeningError>>()?;

    let model_error_result = error_result(
        &consensus.shortlisted,
        &consensus.ranking,
        &model_result.shortlisted,
        &model_result.ranking,
    )
    .map_err(|e| {
        ScreeningError::ConsistencyViolation(format!(
            "model result for job '{}' does not cover the human panel: {e}",
            consensus.job_id
        ))
    })?;

    let entity_comparison = compare_entities(human_results, model_result)?;

    let human_correlations: Vec<f64> = human_error_results
        .iter()
        .map(|h| h.error.rank_correlation)
        .collect();
    let human_distances: Vec<f64> = human_error_results
        .iter()
        .map(|h| h.error.hamming_distance as f64)
        .collect();

    let model_metrics = ModelMetrics {
        ranking_better_or_equal_than_human: better_or_equal_percentage(
            model_error_result.rank_correlation,
            &human_correlations,
            Polarity::HigherIsBetter,
        ),
        categorization_better_or_equal_than_human: better_or_equal_percentage(
            model_error_result.hamming_distance as f64,
            &human_distances,
            Polarity::LowerIsBetter,
        ),
        time_savings_ratio: time_savings_ratio(
            consensus.seconds_taken(),
            model_result.seconds_taken,
        ),
        candidates_filtered: candidates_filtered(&all_candidates, &model_result.shortlisted) as f64,
        filter_accuracy: filter_accuracy(
            &all_candidates,
            &model_result.shortlisted,
            &consensus.shortlisted,
        ),
    };

    let human_metrics = HumanMetrics {
        candidates_filtered: mean(
            human_results
                .iter()
                .map(|h| candidates_filtered(&all_candidates, &h.shortlisted) as f64),
        ),
        filter_accuracy: mean(human_results.iter().map(|h| {
            filter_accuracy(&all_candidates, &h.shortlisted, &consensus.shortlisted)
        })),
    };

    Ok(JobEvaluation {
        job_id: consensus.job_id.clone(),
        consensus: consensus.clone(),
        mean_human_error_result: MeanErrorResult {
            hamming_distance: mean(human_distances.iter().copied()),
            rank_correlation: mean(human_correlations.iter().copied()),
        },
        human_error_results,
        model_result: model_result.clone(),
        model_error_result,
        model_metrics,
        human_metrics,
        entity_comparison,
    })
}

/// Reconciles the human submissions for one job and evaluates the model
/// against the consensus.
pub fn evaluate_job(
    job_id: &str,
    human_results: &[HumanMatchingResult],
    model_result: &ModelMatchingResult,
    panel_size: usize,
) -> Result<JobEvaluation, ScreeningError> {
    if model_result.job_id != job_id {
        return Err(ScreeningError::ConsistencyViolation(format!(
            "model result belongs to job '{}', not '{job_id}'",
            model_result.job_id
        )));
    }
    let consensus = reconcile_humans(job_id, human_results, panel_size)?;
    evaluate(&consensus, human_results, model_result)
}

/// Evaluates every job that has human submissions. A job that cannot be
/// reconciled or has no model result is recorded as failed; the others still
/// contribute to the merged metrics.
pub fn build_report(
    humans_by_job: &BTreeMap<String, Vec<HumanMatchingResult>>,
    model_results: &BTreeMap<String, ModelMatchingResult>,
    panel_size: usize,
) -> EvaluationReport {
    let jobs: Vec<JobEvaluationOutcome> = humans_by_job
        .iter()
        .map(|(job_id, human_results)| {
            let evaluation = model_results
                .get(job_id)
                .ok_or_else(|| {
                    ScreeningError::ConsistencyViolation(format!(
                        "no model result for job '{job_id}'"
                    ))
                })
                .and_then(|model| evaluate_job(job_id, human_results, model, panel_size));
            match evaluation {
                Ok(evaluation) => JobEvaluationOutcome::Evaluated(evaluation),
                Err(e) => {
                    warn!("Evaluation of job '{job_id}' failed: {e}");
                    JobEvaluationOutcome::Failed {
                        job_id: job_id.clone(),
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect();

    let evaluated: Vec<&JobEvaluation> = jobs
        .iter()
        .filter_map(|outcome| match outcome {
            JobEvaluationOutcome::Evaluated(evaluation) => Some(evaluation),
            JobEvaluationOutcome::Failed { .. } => None,
        })
        .collect();
    info!("Evaluated {} of {} jobs", evaluated.len(), jobs.len());

    EvaluationReport {
        panel_size,
        merged: merge_metrics(&evaluated),
        jobs,
    }
}

/// Means of every job-level metric over the evaluated jobs.
pub fn merge_metrics(evaluations: &[&JobEvaluation]) -> Option<MergedMetrics> {
    if evaluations.is_empty() {
        return None;
    }
    let comparisons: Vec<&EntityComparison> =
        evaluations.iter().map(|e| &e.entity_comparison).collect();
    let entity_comparison = mean_comparison(&comparisons);
    if entity_comparison.is_none() {
        warn!("Jobs were screened by different entities, skipping the merged comparison tables");
    }

    Some(MergedMetrics {
        jobs_evaluated: evaluations.len(),
        human_error_result: MeanErrorResult {
            hamming_distance: avg(evaluations, |e| e.mean_human_error_result.hamming_distance),
            rank_correlation: avg(evaluations, |e| e.mean_human_error_result.rank_correlation),
        },
        model_error_result: MeanErrorResult {
            hamming_distance: avg(evaluations, |e| e.model_error_result.hamming_distance as f64),
            rank_correlation: avg(evaluations, |e| e.model_error_result.rank_correlation),
        },
        model_metrics: ModelMetrics {
            ranking_better_or_equal_than_human: avg(evaluations, |e| {
                e.model_metrics.ranking_better_or_equal_than_human
            }),
            categorization_better_or_equal_than_human: avg(evaluations, |e| {
                e.model_metrics.categorization_better_or_equal_than_human
            }),
            time_savings_ratio: avg(evaluations, |e| e.model_metrics.time_savings_ratio),
            candidates_filtered: avg(evaluations, |e| e.model_metrics.candidates_filtered),
            filter_accuracy: avg(evaluations, |e| e.model_metrics.filter_accuracy),
        },
        human_metrics: HumanMetrics {
            candidates_filtered: avg(evaluations, |e| e.human_metrics.candidates_filtered),
            filter_accuracy: avg(evaluations, |e| e.human_metrics.filter_accuracy),
        },
        entity_comparison,
    })
}

fn avg(evaluations: &[&JobEvaluation], metric: impl Fn(&JobEvaluation) -> f64) -> f64 {
    mean(evaluations.iter().map(|&e| metric(e)))
}
