//! Concurrency Orchestrator: fans scoring work out as a task graph
//! (job → candidate → requirement) over one bounded request pool.
//!
//! - Every answer-engine request holds a permit of a single `Semaphore`, so the
//!   number of in-flight requests never exceeds `RunContext::concurrency_limit`
//!   no matter how deep the fan-out is. Structural tasks hold no permit.
//! - Results are re-associated with their inputs by index tag, never by
//!   completion order.
//! - A failed requirement aborts its candidate's remaining requests; sibling
//!   candidates and jobs carry on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::catalog::{RequirementCategory, RunContext};
use crate::errors::ScreeningError;
use crate::llm_client::{AnswerEngine, LlmError};
use crate::matching::aggregator::compute_total_score;
use crate::matching::classifier::classify_candidate;
use crate::matching::extractor::extract_requirements;
use crate::matching::matcher::match_requirement;
use crate::models::evaluation::{ModelMatchingResult, ScoredCandidate};
use crate::models::screening::{
    ApplicantMatch, Requirement, RequirementMatch, RequirementMatches, RequirementsByCategory,
};

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outcomes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub name: String,
    pub cv_text: String,
}

#[derive(Debug, Clone)]
pub struct JobWorkload {
    pub job_id: String,
    pub job_text: String,
    pub candidates: Vec<CandidateInput>,
}

impl JobWorkload {
    /// First candidate name listed more than once. Names key the ranking, so
    /// a workload with a repeat cannot be scored.
    pub fn duplicate_candidate(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.candidates
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// One candidate's pipeline result. A failed candidate carries its error and
/// never a default score.
#[derive(Debug)]
pub struct CandidateOutcome {
    pub candidate: String,
    pub result: Result<ApplicantMatch, ScreeningError>,
}

#[derive(Debug)]
pub struct JobScoring {
    pub job_id: String,
    pub requirements: Result<RequirementsByCategory, ScreeningError>,
    /// Same order as the workload's candidates.
    pub outcomes: Vec<CandidateOutcome>,
    pub seconds_taken: f64,
}

/// Serializable view of a candidate outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateReport {
    Matched {
        candidate: String,
        /// Mean score per category that had requirements.
        category_scores: BTreeMap<RequirementCategory, f64>,
        applicant_match: ApplicantMatch,
    },
    Failed {
        candidate: String,
        error_kind: String,
        error: String,
    },
}

/// Serializable view of a job scoring.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: String,
    pub seconds_taken: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementsByCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
    pub candidates: Vec<CandidateReport>,
}

impl CandidateOutcome {
    pub fn report(&self) -> CandidateReport {
        match &self.result {
            Ok(applicant_match) => CandidateReport::Matched {
                candidate: self.candidate.clone(),
                category_scores: applicant_match.category_scores(),
                applicant_match: applicant_match.clone(),
            },
            Err(e) => CandidateReport::Failed {
                candidate: self.candidate.clone(),
                error_kind: e.kind().to_string(),
                error: e.to_string(),
            },
        }
    }
}

impl JobScoring {
    pub fn report(&self) -> JobReport {
        JobReport {
            job_id: self.job_id.clone(),
            seconds_taken: self.seconds_taken,
            requirements: self.requirements.as_ref().ok().cloned(),
            extraction_error: self.requirements.as_ref().err().map(ToString::to_string),
            candidates: self.outcomes.iter().map(CandidateOutcome::report).collect(),
        }
    }

    /// Model result over the candidates that were scored successfully.
    /// `None` when the job's requirements could not be extracted.
    pub fn model_result(&self) -> Option<ModelMatchingResult> {
        self.requirements.as_ref().ok()?;
        let scored = self
            .outcomes
            .iter()
            .filter_map(|o| {
                o.result.as_ref().ok().map(|m| ScoredCandidate {
                    name: o.candidate.clone(),
                    total_score: m.total_score,
                    promising: m.promising_result.promising,
                })
            })
            .collect();
        Some(ModelMatchingResult::from_scored(
            &self.job_id,
            self.seconds_taken,
            scored,
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bounded request pool
// ────────────────────────────────────────────────────────────────────────────

/// Wraps an engine so every request first takes a permit from the shared pool.
struct PooledEngine {
    inner: Arc<dyn AnswerEngine>,
    permits: Arc<Semaphore>,
}

#[async_trait]
impl AnswerEngine for PooledEngine {
    async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LlmError::PoolClosed)?;
        self.inner.submit(prompt).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Orchestrator {
    engine: Arc<dyn AnswerEngine>,
    ctx: Arc<RunContext>,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn AnswerEngine>, ctx: Arc<RunContext>) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.concurrency_limit));
        Self {
            engine: Arc::new(PooledEngine {
                inner: engine,
                permits,
            }),
            ctx,
        }
    }

    /// Scores one candidate: all requirement matches concurrently, then the
    /// promising check, then the aggregate score.
    pub async fn match_candidate(
        &self,
        cv_text: &str,
        requirements: &RequirementsByCategory,
    ) -> Result<ApplicantMatch, ScreeningError> {
        let work: Vec<(RequirementCategory, Requirement)> = requirements
            .iter()
            .filter(|(category, _)| self.ctx.weighting.contains(**category))
            .flat_map(|(&category, reqs)| reqs.iter().map(move |r| (category, r.clone())))
            .collect();

        let cv_text: Arc<str> = Arc::from(cv_text);
        let mut join_set = JoinSet::new();
        for (index, (category, requirement)) in work.iter().cloned().enumerate() {
            let engine = self.engine.clone();
            let bounds = self.ctx.bounds;
            let cv_text = cv_text.clone();
            join_set.spawn(async move {
                let result =
                    match_requirement(engine.as_ref(), &bounds, &cv_text, category, &requirement)
                        .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<RequirementMatch>> = vec![None; work.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(worker_error)?;
            match result {
                Ok(matched) => slots[index] = Some(matched),
                Err(e) => {
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        let mut requirement_matches: RequirementMatches = self
            .ctx
            .weighting
            .categories()
            .map(|category| (category, Vec::new()))
            .collect();
        for ((category, _), slot) in work.into_iter().zip(slots) {
            let matched = slot.ok_or_else(|| {
                ScreeningError::Worker("requirement match missing after join".to_string())
            })?;
            requirement_matches.entry(category).or_default().push(matched);
        }

        let promising_result =
            classify_candidate(self.engine.as_ref(), &self.ctx.bounds, &requirement_matches)
                .await?;
        let total_score =
            compute_total_score(&requirement_matches, &self.ctx.weighting, &self.ctx.bounds);

        Ok(ApplicantMatch {
            total_score,
            promising_result,
            requirement_matches,
        })
    }

    /// Scores every candidate of one job concurrently. One outcome per
    /// candidate, in input order.
    pub async fn score_job(
        &self,
        requirements: Arc<RequirementsByCategory>,
        candidates: Vec<CandidateInput>,
    ) -> Vec<CandidateOutcome> {
        let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
        let mut join_set = JoinSet::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            let this = self.clone();
            let requirements = requirements.clone();
            join_set.spawn(async move {
                info!("Matching candidate '{}'", candidate.name);
                let result = this.match_candidate(&candidate.cv_text, &requirements).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<ApplicantMatch, ScreeningError>>> =
            (0..names.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!("Candidate task failed to join: {e}"),
            }
        }

        names
            .into_iter()
            .zip(slots)
            .map(|(candidate, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(ScreeningError::Worker("candidate task did not complete".to_string()))
                });
                match &result {
                    Ok(m) => info!(
                        "Candidate '{candidate}' scored {:.2} (promising={})",
                        m.total_score, m.promising_result.promising
                    ),
                    Err(e) => warn!("Candidate '{candidate}' failed: {e}"),
                }
                CandidateOutcome { candidate, result }
            })
            .collect()
    }

    /// Full pipeline for one job: extract requirements, then score candidates.
    pub async fn run_job(&self, workload: JobWorkload) -> JobScoring {
        let started = Instant::now();
        info!(
            "Scoring job '{}' with {} candidates",
            workload.job_id,
            workload.candidates.len()
        );

        let requirements =
            extract_requirements(self.engine.as_ref(), &self.ctx, &workload.job_text).await;
        let (requirements, outcomes) = match requirements {
            Ok(reqs) => {
                let reqs = Arc::new(reqs);
                let outcomes = self.score_job(reqs.clone(), workload.candidates).await;
                (Ok(Arc::unwrap_or_clone(reqs)), outcomes)
            }
            Err(e) => {
                warn!("Requirement extraction failed for job '{}': {e}", workload.job_id);
                (Err(e), Vec::new())
            }
        };

        let seconds_taken = started.elapsed().as_secs_f64();
        info!(
            "Task of type \"job_scoring\" with id \"{}\" completed in {:.0} seconds",
            workload.job_id,
            seconds_taken.ceil()
        );

        JobScoring {
            job_id: workload.job_id,
            requirements,
            outcomes,
            seconds_taken,
        }
    }

    /// Runs every job concurrently. One scoring per job, in input order.
    pub async fn score_run(&self, jobs: Vec<JobWorkload>) -> Vec<JobScoring> {
        let started = Instant::now();
        let job_ids: Vec<String> = jobs.iter().map(|j| j.job_id.clone()).collect();
        let mut join_set = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let this = self.clone();
            join_set.spawn(async move { (index, this.run_job(job).await) });
        }

        let mut slots: Vec<Option<JobScoring>> = (0..job_ids.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, scoring)) => slots[index] = Some(scoring),
                Err(e) => warn!("Job task failed to join: {e}"),
            }
        }

        info!(
            "Scored {} jobs in {:.1} seconds",
            job_ids.len(),
            started.elapsed().as_secs_f64()
        );

        job_ids
            .into_iter()
            .zip(slots)
            .map(|(job_id, slot)| {
                slot.unwrap_or_else(|| JobScoring {
                    job_id,
                    requirements: Err(ScreeningError::Worker(
                        "job task did not complete".to_string(),
                    )),
                    outcomes: Vec::new(),
                    seconds_taken: 0.0,
                })
            })
            .collect()
    }
}

fn worker_error(e: JoinError) -> ScreeningError {
    ScreeningError::Worker(e.to_string())
}
