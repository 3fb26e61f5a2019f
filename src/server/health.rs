//! Health check endpoint

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: liveness probe with the running version
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
