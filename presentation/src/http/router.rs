//! Router and middleware stack

use super::handlers;
use super::state::AppState;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Middleware settings taken from `[server]`
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origin; any origin when unset.
    pub frontend_url: Option<String>,
    pub request_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            frontend_url: None,
            request_timeout: Duration::from_secs(600),
        }
    }
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Invalid frontend_url, allowing any origin: {e}");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

/// Create the application router with all routes
pub fn create_router(state: Arc<AppState>, config: &RouterConfig) -> Router {
    Router::new()
        .route("/api/input_task", post(handlers::input_task))
        .route("/api/human_feedback", post(handlers::human_feedback))
        .route(
            "/api/human_clarification_on_plan",
            post(handlers::human_clarification),
        )
        .route(
            "/api/approve_step_or_steps",
            post(handlers::approve_step_or_steps),
        )
        .route("/api/plans", get(handlers::plans))
        .route("/api/steps/:plan_id", get(handlers::steps_by_plan))
        .route(
            "/api/agent_messages/:session_id",
            get(handlers::agent_messages),
        )
        .route(
            "/api/messages",
            get(handlers::all_messages).delete(handlers::delete_all_messages),
        )
        .route("/api/agent-tools", get(handlers::agent_tools))
        .route("/healthz", get(handlers::healthz))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.frontend_url.as_deref()))
        .with_state(state)
}
