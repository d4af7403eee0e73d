//! Route wiring: every handler module plus the [`router`] that assembles
//! them into the wire surface spec.md §6 lists.

pub mod approvals;
pub mod executions;
pub mod forms;
pub mod webhooks;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application [`Router`], wired against `state`.
///
/// Layer order (outermost first): tracing, compression, a per-request
/// timeout, CORS, then a body-size cap matching [`crate::config::EngineConfig::max_payload_bytes`]
/// so an oversized webhook/form body is rejected by the framework before a
/// handler ever sees it.
#[must_use]
pub fn router(state: AppState) -> Router {
    let max_payload_bytes = state.config.max_payload_bytes;

    let execution_routes = Router::new()
        .route("/api/executions", post(executions::start))
        .route("/api/executions/{id}", get(executions::get))
        .route("/api/executions/{id}/cancel", post(executions::cancel))
        .route("/api/executions/{id}/retry", post(executions::retry))
        .route("/api/executions/{id}/resume", post(executions::resume));

    let approval_routes = Router::new().route("/api/approvals/{id}/actions", post(approvals::cast_action));

    let form_routes = Router::new()
        .route("/forms/{token}", get(forms::get_definition))
        .route("/forms/{token}/submit", post(forms::submit_trigger))
        .route("/forms/execution/{execution_id}/submit", post(forms::submit_in_flow));

    let webhook_routes = Router::new().route("/webhook/{path}", any(webhooks::handle));

    Router::new()
        .merge(execution_routes)
        .merge(approval_routes)
        .merge(form_routes)
        .merge(webhook_routes)
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(60)))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
