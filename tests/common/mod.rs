//! Shared helpers for integration tests
//!
//! Builds the full router over wiremock-backed model and CRM upstreams so
//! tests exercise the real request pipeline in-process.

use axum::body::Body;
use axum::Router;
use http::Request;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voxcrm::config::Config;

/// Builds a config pointing at mock upstreams
pub fn test_config(provider_base: &str, crm_base: &str, db_path: &PathBuf) -> Config {
    let mut config = Config::default();
    config.server.behind_proxy = true;
    config.provider.api_base = provider_base.to_string();
    config.crm.api_base = crm_base.to_string();
    config.session.db_path = Some(db_path.to_string_lossy().to_string());
    config
}

/// Builds the router for a config
pub fn build_app(config: Config) -> Router {
    let state = voxcrm::server::bootstrap(config).expect("bootstrap failed");
    voxcrm::server::build_router(Arc::new(state))
}

/// Creates a temp dir and the session db path inside it
pub fn temp_session_db() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    (tmp, db_path)
}

/// Mounts the current-user endpoint answering every cookie with one user
pub async fn mount_current_user(server: &MockServer, user_id: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "name": name,
        })))
        .mount(server)
        .await;
}

/// A chat-completions body carrying a terminal text message
pub fn completion_text(text: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "choices": [{
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 18, "total_tokens": 138 }
    })
}

/// A chat-completions body carrying one tool-call request
pub fn completion_tool_call(call_id: &str, name: &str, arguments: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": call_id,
                    "type": "function",
                    "function": { "name": name, "arguments": arguments }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 140, "completion_tokens": 24, "total_tokens": 164 }
    })
}

/// Builds a `POST /chat` request
pub fn chat_request(body: &Value, ip: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

/// Reads a JSON response body
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not JSON")
}
