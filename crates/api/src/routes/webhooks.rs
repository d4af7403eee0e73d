//! `ANY /webhook/{path}` — the at-least-once external event ingress
//! (spec.md §4.5, §6). Routing is keyed on `(path, method)`; authentication
//! and the 1 MiB payload cap are delegated to [`nebula_trigger::Webhook`]
//! itself, so this handler is just the HTTP-shaped glue around it.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use nebula_error::NebulaError;
use nebula_execution::TriggerType;
use nebula_store::WebhookRepo;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::routes::executions::require_published;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Serialize)]
pub struct WebhookAcceptedResponse {
    pub execution_id: nebula_core::ExecutionId,
}

pub async fn handle(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookAcceptedResponse>), ApiError> {
    state.check_ingress_rate_limit()?;
    nebula_trigger::validate_path(&path).map_err(ApiError::from)?;

    let webhook = state
        .webhooks
        .find_webhook_by_route(&path, method.as_str())
        .await?
        .ok_or_else(|| {
            NebulaError::new(
                nebula_error::ErrorKind::FlowNotFound,
                format!("no webhook registered for {method} /webhook/{path}"),
            )
        })?;

    let signature = header_str(&headers, SIGNATURE_HEADER);
    let authorization = header_str(&headers, axum::http::header::AUTHORIZATION.as_str());
    webhook.authenticate(&body, signature, authorization)?;

    let version = require_published(&state, webhook.flow_id).await?;
    let payload: Value = serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));

    let execution = state
        .coordinator
        .start_execution(webhook.flow_id, Some(version), payload, Value::Null, None, TriggerType::Webhook)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(WebhookAcceptedResponse { execution_id: execution.id }),
    ))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
