use axum::Json;
use serde_json::{json, Value};

use crate::llm_client::MODEL;

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "screener",
        "model": MODEL
    }))
}
