//! HTTP server for the voxcrm agent
//!
//! Wires the orchestration loop, session store, cache, and rate limiters
//! into an axum router exposing `POST /chat` and `GET /health`.

pub mod health;
pub mod routes;

use crate::agent::Orchestrator;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::crm::CrmClient;
use crate::error::Result;
use crate::guardrails::InjectionScanner;
use crate::prompts::PromptLibrary;
use crate::providers::ChatCompletionsProvider;
use crate::ratelimit::RateLimiter;
use crate::session::TieredSessionStore;
use crate::tools::registry_builder::build_default_registry;
use crate::tools::ToolExecutor;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

/// Shared state behind every request handler
pub struct AppState {
    /// Service configuration
    pub config: Config,
    /// The orchestration loop
    pub orchestrator: Orchestrator,
    /// Two-tier session store
    pub sessions: TieredSessionStore,
    /// Response cache for tool-free turns
    pub cache: ResponseCache,
    /// Pre-auth limiter keyed by client IP
    pub ip_limiter: RateLimiter,
    /// Post-auth limiter keyed by user id
    pub user_limiter: RateLimiter,
    /// CRM data-API client (auth and tool handlers share it)
    pub crm: Arc<CrmClient>,
    /// Prompt-injection detector
    pub scanner: InjectionScanner,
}

/// Builds the application state from configuration
///
/// # Errors
///
/// Returns an error when a client cannot be constructed or the
/// orchestrator configuration is invalid. Session database problems do
/// not fail bootstrap; the store degrades to its in-memory tier.
pub fn bootstrap(config: Config) -> Result<AppState> {
    let crm = Arc::new(CrmClient::new(config.crm.clone())?);
    let provider = Arc::new(ChatCompletionsProvider::new(config.provider.clone())?);

    let registry = build_default_registry(crm.clone());
    let executor = ToolExecutor::new(registry);
    let prompts = Arc::new(PromptLibrary::new());
    let orchestrator = Orchestrator::new(provider, executor, prompts, config.agent.clone())?;

    let sessions = TieredSessionStore::open(&config.session);
    let cache = ResponseCache::new(Duration::from_secs(config.cache.ttl_seconds));
    let ip_limiter = RateLimiter::new(
        config.limits.ip_max,
        Duration::from_secs(config.limits.ip_window_seconds),
    );
    let user_limiter = RateLimiter::new(
        config.limits.user_max,
        Duration::from_secs(config.limits.user_window_seconds),
    );

    Ok(AppState {
        config,
        orchestrator,
        sessions,
        cache,
        ip_limiter,
        user_limiter,
        crm,
        scanner: InjectionScanner::new(),
    })
}

/// Builds the router over shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(routes::chat))
        .route("/health", get(health::health))
        .with_state(state)
}
