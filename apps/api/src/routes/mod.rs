pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as evaluation;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scoring
        .route("/api/v1/match", post(matching::handle_match))
        .route("/api/v1/runs/:id", get(matching::handle_get_run))
        .route(
            "/api/v1/runs/:id/model-result",
            get(matching::handle_get_model_result),
        )
        // Evaluation against the human baseline
        .route("/api/v1/evaluate", post(evaluation::handle_evaluate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::catalog::RunContext;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedEngine;
    use crate::matching::orchestrator::Orchestrator;

    fn test_state() -> AppState {
        let config = Config {
            anthropic_api_key: None,
            database_url: None,
            port: 0,
            rust_log: "info".to_string(),
            score_min: 0.0,
            score_max: 100.0,
            max_concurrent_requests: 4,
            category_weights: None,
            panel_size: 4,
        };
        AppState {
            db: PgPoolOptions::new()
                .connect_lazy("postgres://screener@localhost/screener_test")
                .unwrap(),
            orchestrator: Orchestrator::new(
                Arc::new(ScriptedEngine::new()),
                Arc::new(RunContext::default()),
            ),
            config,
        }
    }

    fn human(id: u32, shortlist: &[&str], order: &[&str]) -> Value {
        let ranking: serde_json::Map<String, Value> = order
            .iter()
            .enumerate()
            .map(|(i, name)| ((i + 1).to_string(), json!(name)))
            .collect();
        json!({
            "submitter_id": id,
            "job_id": "backend",
            "timestamp": "2024-03-01T10:00:00Z",
            "minutes_taken": 20,
            "shortlisted": shortlist,
            "ranking": ranking
        })
    }

    fn evaluate_request(humans: Vec<Value>) -> Request<Body> {
        let body = json!({
            "human_results": humans,
            "model_result": {
                "job_id": "backend",
                "seconds_taken": 120.0,
                "shortlisted": ["B"],
                "ranking": {"1": "B", "2": "A", "3": "C", "4": "D"}
            }
        });
        Request::builder()
            .method("POST")
            .uri("/api/v1/evaluate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(files: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str("--XBOUNDARY--\r\n");
        Request::builder()
            .method("POST")
            .uri("/api/v1/match")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "screener");
    }

    #[tokio::test]
    async fn test_evaluate_returns_job_evaluation() {
        let app = build_router(test_state());
        let response = app
            .oneshot(evaluate_request(vec![
                human(1, &["A", "B"], &["A", "B", "C", "D"]),
                human(2, &["B", "C"], &["B", "C", "A", "D"]),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["consensus"]["shortlisted"], json!(["B"]));
        assert_eq!(body["model_error_result"]["rank_correlation"], 1.0);
        assert_eq!(body["human_error_results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_inconsistent_submission() {
        let app = build_router(test_state());
        let response = app
            .oneshot(evaluate_request(vec![human(1, &["B", "C"], &["A", "B", "C", "D"])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_match_requires_job_and_cv() {
        let app = build_router(test_state());
        let response = app
            .oneshot(multipart_request(&[("job.txt", "Rust developer wanted")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_rejects_unsupported_documents() {
        let app = build_router(test_state());
        let response = app
            .oneshot(multipart_request(&[("job.txt", "Rust developer"), ("cv.docx", "x")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_id_must_be_uuid() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/runs/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
