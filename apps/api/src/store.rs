//! Result store: scoring runs are written once and never mutated.
//! Each matched candidate keeps its full `ApplicantMatch` as JSONB so any
//! downstream table can be regenerated without re-running judgments.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::matching::orchestrator::JobScoring;
use crate::models::evaluation::{ModelMatchingResult, ScoredCandidate};
use crate::models::run::{ApplicantMatchRow, CandidateFailureRow, ScoringRunRow};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS scoring_runs (
        id               UUID PRIMARY KEY,
        job_id           TEXT NOT NULL,
        requirements     JSONB,
        extraction_error TEXT,
        seconds_taken    DOUBLE PRECISION NOT NULL,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applicant_matches (
        id          UUID PRIMARY KEY,
        run_id      UUID NOT NULL REFERENCES scoring_runs(id),
        position    INTEGER NOT NULL,
        candidate   TEXT NOT NULL,
        total_score DOUBLE PRECISION NOT NULL,
        promising   BOOLEAN NOT NULL,
        result      JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS candidate_failures (
        id            UUID PRIMARY KEY,
        run_id        UUID NOT NULL REFERENCES scoring_runs(id),
        position      INTEGER NOT NULL,
        candidate     TEXT NOT NULL,
        error_kind    TEXT NOT NULL,
        error_message TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// A stored run with its matched and failed candidates, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRun {
    pub run: ScoringRunRow,
    pub matches: Vec<ApplicantMatchRow>,
    pub failures: Vec<CandidateFailureRow>,
}

/// Creates the result tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply result store schema")?;
    }
    info!("Result store schema ready");
    Ok(())
}

/// Persists one job scoring in a single transaction and returns the run id.
pub async fn persist_job_scoring(pool: &PgPool, scoring: &JobScoring) -> Result<Uuid> {
    let run_id = Uuid::new_v4();
    let requirements = scoring
        .requirements
        .as_ref()
        .ok()
        .map(serde_json::to_value)
        .transpose()?;
    let extraction_error = scoring.requirements.as_ref().err().map(ToString::to_string);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO scoring_runs (id, job_id, requirements, extraction_error, seconds_taken)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(run_id)
    .bind(&scoring.job_id)
    .bind(requirements)
    .bind(extraction_error)
    .bind(scoring.seconds_taken)
    .execute(&mut *tx)
    .await?;

    for (position, outcome) in scoring.outcomes.iter().enumerate() {
        let position = i32::try_from(position).context("Too many candidates in one run")?;
        match &outcome.result {
            Ok(applicant_match) => {
                sqlx::query(
                    r#"
                    INSERT INTO applicant_matches
                        (id, run_id, position, candidate, total_score, promising, result)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(run_id)
                .bind(position)
                .bind(&outcome.candidate)
                .bind(applicant_match.total_score)
                .bind(applicant_match.promising_result.promising)
                .bind(serde_json::to_value(applicant_match)?)
                .execute(&mut *tx)
                .await?;
            }
            Err(e) => {
                sqlx::query(
                    r#"
                    INSERT INTO candidate_failures
                        (id, run_id, position, candidate, error_kind, error_message)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(run_id)
                .bind(position)
                .bind(&outcome.candidate)
                .bind(e.kind())
                .bind(e.to_string())
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    info!(
        "Persisted run {run_id} for job '{}' ({} candidates)",
        scoring.job_id,
        scoring.outcomes.len()
    );
    Ok(run_id)
}

pub async fn load_run(pool: &PgPool, run_id: Uuid) -> Result<Option<StoredRun>> {
    let run: Option<ScoringRunRow> = sqlx::query_as("SELECT * FROM scoring_runs WHERE id = $1")
        .bind(run_id)
        .fetch_optional(pool)
        .await?;
    let Some(run) = run else {
        return Ok(None);
    };

    let matches = sqlx::query_as::<_, ApplicantMatchRow>(
        "SELECT * FROM applicant_matches WHERE run_id = $1 ORDER BY position ASC",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    let failures = sqlx::query_as::<_, CandidateFailureRow>(
        "SELECT * FROM candidate_failures WHERE run_id = $1 ORDER BY position ASC",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(StoredRun {
        run,
        matches,
        failures,
    }))
}

/// Rebuilds the model result of a stored run. `None` when the run does not
/// exist or its requirements were never extracted.
pub async fn load_model_result(pool: &PgPool, run_id: Uuid) -> Result<Option<ModelMatchingResult>> {
    Ok(load_run(pool, run_id).await?.and_then(|stored| stored.model_result()))
}

impl StoredRun {
    pub fn model_result(&self) -> Option<ModelMatchingResult> {
        self.run.requirements.as_ref()?;
        let scored = self
            .matches
            .iter()
            .map(|row| ScoredCandidate {
                name: row.candidate.clone(),
                total_score: row.total_score,
                promising: row.promising,
            })
            .collect();
        Some(ModelMatchingResult::from_scored(
            &self.run.job_id,
            self.run.seconds_taken,
            scored,
        ))
    }
}
