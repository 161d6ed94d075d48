use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Failures of the screening core. Each one aborts exactly one unit of work:
/// a candidate pipeline (matcher / classifier) or one job's reconciliation.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// The answer text held no parseable `{...}` payload.
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String, raw: String },

    /// A payload parsed but did not fit the expected schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A human submission or ranking breaks the bijection / prefix rules.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("answer engine failed: {0}")]
    Engine(#[from] LlmError),

    #[error("document error: {0}")]
    Document(String),

    /// A spawned pipeline task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl ScreeningError {
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        ScreeningError::MalformedResponse {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// Stable label stored with failed candidates.
    pub fn kind(&self) -> &'static str {
        match self {
            ScreeningError::MalformedResponse { .. } => "malformed_response",
            ScreeningError::SchemaViolation(_) => "schema_violation",
            ScreeningError::ConsistencyViolation(_) => "consistency_violation",
            ScreeningError::Engine(_) => "engine",
            ScreeningError::Document(_) => "document",
            ScreeningError::Worker(_) => "worker",
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScreeningError> for AppError {
    fn from(err: ScreeningError) -> Self {
        match err {
            ScreeningError::ConsistencyViolation(_) | ScreeningError::SchemaViolation(_) => {
                AppError::UnprocessableEntity(err.to_string())
            }
            ScreeningError::MalformedResponse { .. } | ScreeningError::Engine(_) => {
                AppError::Llm(err.to_string())
            }
            ScreeningError::Document(msg) => AppError::Validation(msg),
            ScreeningError::Worker(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The answer engine did not produce a usable judgment".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
