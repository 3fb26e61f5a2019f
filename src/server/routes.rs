//! The chat endpoint
//!
//! `POST /chat` runs the full request pipeline: IP rate limit, input
//! validation, cookie auth, user rate limit, injection scan, cache probe,
//! orchestration, session append, cache store. Rate-limit and control-
//! plane failures short-circuit before any upstream cost is paid.

use crate::agent::TurnRequest;
use crate::auth::authenticate;
use crate::error::{Result, VoxcrmError};
use crate::guardrails::{validate_question, validate_session_id};
use crate::prompts::Language;
use crate::ratelimit::{ip_key, user_key, RateDecision};
use crate::server::AppState;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// `POST /chat` request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// Opaque conversation id
    pub session_id: Option<String>,
    /// The user's utterance
    pub question: Option<String>,
    /// Page the user is currently on, for cache context
    pub page_path: Option<String>,
    /// Response language flag (`en`/`es`)
    pub language: Option<String>,
}

/// `POST /chat` success body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Final natural-language response
    pub response: String,
    /// Always true on 200
    pub success: bool,
    /// Wall-clock time spent serving the request (milliseconds)
    pub duration: u64,
    /// Model the response came from
    pub model: String,
    /// UI directives, navigation first
    pub client_actions: Vec<crate::agent::ClientAction>,
    /// True when the response came from the cache
    pub cached: bool,
}

/// Error body shared by all failure statuses
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// `POST /chat` handler
pub async fn chat(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> Response {
    let started = Instant::now();

    // Pre-auth limit keyed by client IP: abusive traffic never reaches
    // auth or the model.
    let client_ip = client_ip(&state, &headers, connect_info.as_ref().map(|c| &c.0));
    if let RateDecision::Denied { retry_after_secs } = state.ip_limiter.check(&ip_key(&client_ip)) {
        tracing::warn!("IP rate limit hit for {}", client_ip);
        return error_response(VoxcrmError::RateLimited { retry_after_secs }.into());
    }

    match handle_chat(&state, &headers, &body, started).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response(e),
    }
}

/// The fallible request pipeline behind the handler
async fn handle_chat(
    state: &AppState,
    headers: &HeaderMap,
    body: &ChatBody,
    started: Instant,
) -> Result<ChatReply> {
    let session_id = validate_session_id(body.session_id.as_deref())?;
    let question = validate_question(
        body.question.as_deref(),
        state.config.agent.max_question_chars,
    )?;

    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let ctx = authenticate(&state.crm, cookie_header).await?;

    // Post-auth limit keyed by user id
    if let RateDecision::Denied { retry_after_secs } =
        state.user_limiter.check(&user_key(&ctx.user_id))
    {
        tracing::warn!("User rate limit hit for {}", ctx.user_id);
        return Err(VoxcrmError::RateLimited { retry_after_secs }.into());
    }

    // Advisory only: the request proceeds either way
    if let Some(label) = state.scanner.scan(question) {
        tracing::warn!(
            "Possible prompt injection ({}) from user {}, request allowed",
            label,
            ctx.user_id
        );
    }

    let page_path = body.page_path.as_deref().unwrap_or("");
    if let Some(hit) = state.cache.get(&ctx.user_id, question, page_path) {
        tracing::debug!("Cache hit for user {}", ctx.user_id);
        return Ok(ChatReply {
            response: hit.response,
            success: true,
            duration: started.elapsed().as_millis() as u64,
            model: hit.model,
            client_actions: Vec::new(),
            cached: true,
        });
    }

    let history = state.sessions.load(session_id, &ctx.user_id)?;
    let language = Language::parse_loose(body.language.as_deref());

    let outcome = state
        .orchestrator
        .run_turn(TurnRequest {
            question,
            language,
            history: &history,
            ctx: &ctx,
        })
        .await?;

    state
        .sessions
        .append(session_id, &ctx.user_id, &outcome.new_messages)?;

    // Only tool-free turns are cacheable; replaying a turn that performed
    // a write would skip the write.
    if !outcome.used_tools {
        state.cache.put(
            &ctx.user_id,
            question,
            page_path,
            &outcome.response,
            &outcome.model,
        );
    }

    Ok(ChatReply {
        response: outcome.response,
        success: true,
        duration: started.elapsed().as_millis() as u64,
        model: outcome.model,
        client_actions: outcome.actions.into_ordered(),
        cached: false,
    })
}

/// Resolves the client IP for rate limiting
///
/// Behind a trusted proxy the first X-Forwarded-For hop wins; otherwise
/// the socket address is used.
fn client_ip(state: &AppState, headers: &HeaderMap, socket: Option<&SocketAddr>) -> String {
    if state.config.server.behind_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    socket
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Maps an error onto its HTTP response
///
/// Upstream details never reach the caller; they are logged server-side
/// and replaced by a generic message.
fn error_response(error: anyhow::Error) -> Response {
    match error.downcast_ref::<VoxcrmError>() {
        Some(VoxcrmError::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: message.clone(),
            }),
        )
            .into_response(),
        Some(VoxcrmError::Auth(message)) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: message.clone(),
            }),
        )
            .into_response(),
        Some(VoxcrmError::RateLimited { retry_after_secs }) => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    error: "Too many requests".to_string(),
                }),
            )
                .into_response();
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
        _ => {
            tracing::error!("Chat request failed: {:#}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Something went wrong. Please try again.".to_string(),
                }),
            )
                .into_response()
        }
    }
}
