use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::documents::{document_name, extract_text};
use crate::errors::AppError;
use crate::matching::orchestrator::{CandidateInput, JobReport, JobWorkload};
use crate::models::evaluation::ModelMatchingResult;
use crate::state::AppState;
use crate::store::{self, StoredRun};

#[derive(Serialize)]
pub struct MatchResponse {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub report: JobReport,
}

struct UploadedFile {
    name: String,
    text: String,
}

/// POST /api/v1/match
/// Multipart upload: the first file is the job description, every further
/// file is one candidate CV.
pub async fn handle_match(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read '{file_name}': {e}")))?;
        files.push(UploadedFile {
            name: document_name(&file_name),
            text: extract_text(&file_name, bytes).await?,
        });
    }

    let workload = workload_from_files(files)?;
    let scoring = state.orchestrator.run_job(workload).await;
    let run_id = store::persist_job_scoring(&state.db, &scoring).await?;

    Ok(Json(MatchResponse {
        run_id,
        report: scoring.report(),
    }))
}

/// GET /api/v1/runs/:id
pub async fn handle_get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredRun>, AppError> {
    let run = store::load_run(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Run {id} not found")))?;
    Ok(Json(run))
}

/// GET /api/v1/runs/:id/model-result
pub async fn handle_get_model_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModelMatchingResult>, AppError> {
    let result = store::load_model_result(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No model result for run {id}")))?;
    Ok(Json(result))
}

fn workload_from_files(files: Vec<UploadedFile>) -> Result<JobWorkload, AppError> {
    if files.len() < 2 {
        return Err(AppError::Validation(
            "Upload the job description followed by at least one CV".to_string(),
        ));
    }
    let mut files = files.into_iter();
    let job = files
        .next()
        .ok_or_else(|| AppError::Validation("Missing job description".to_string()))?;
    let workload = JobWorkload {
        job_id: job.name,
        job_text: job.text,
        candidates: files
            .map(|f| CandidateInput {
                name: f.name,
                cv_text: f.text,
            })
            .collect(),
    };
    if let Some(name) = workload.duplicate_candidate() {
        return Err(AppError::Validation(format!(
            "More than one CV is named '{name}'; candidate names must be unique"
        )));
    }
    Ok(workload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            text: format!("{name} text"),
        }
    }

    #[test]
    fn test_first_file_is_the_job() {
        let workload =
            workload_from_files(vec![file("backend"), file("alice"), file("bob")]).unwrap();
        assert_eq!(workload.job_id, "backend");
        assert_eq!(workload.job_text, "backend text");
        let names: Vec<_> = workload.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn test_cvs_with_same_name_rejected() {
        // alice.pdf and alice.txt both become "alice"
        let result = workload_from_files(vec![file("backend"), file("alice"), file("alice")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_cv_may_share_the_job_name() {
        assert!(workload_from_files(vec![file("backend"), file("backend")]).is_ok());
    }

    #[test]
    fn test_job_without_cvs_rejected() {
        assert!(matches!(
            workload_from_files(vec![file("backend")]),
            Err(AppError::Validation(_))
        ));
    }
}
