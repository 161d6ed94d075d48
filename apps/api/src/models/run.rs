use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoringRunRow {
    pub id: Uuid,
    pub job_id: String,
    /// `None` when requirement extraction failed.
    pub requirements: Option<Value>,
    pub extraction_error: Option<String>,
    pub seconds_taken: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantMatchRow {
    pub id: Uuid,
    pub run_id: Uuid,
    pub position: i32,
    pub candidate: String,
    pub total_score: f64,
    pub promising: bool,
    /// Full `ApplicantMatch`, enough to regenerate any downstream table.
    pub result: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateFailureRow {
    pub id: Uuid,
    pub run_id: Uuid,
    pub position: i32,
    pub candidate: String,
    pub error_kind: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}
