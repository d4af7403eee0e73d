//! `/api/executions` — start, inspect, cancel, retry, resume (spec.md §6).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use nebula_core::{ExecutionId, FlowId};
use nebula_execution::Execution;
use nebula_store::{ExecutionRepo, FlowRepo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartExecutionRequest {
    pub flow_id: FlowId,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub context: Value,
}

#[derive(Deserialize)]
pub struct CancelExecutionRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ResumeExecutionRequest {
    pub data: Value,
}

/// The wire view of an [`Execution`]: the stored record plus `can_retry`,
/// derived rather than stored (spec.md §6's `GET /api/executions/{id}`).
#[derive(Serialize)]
pub struct ExecutionView {
    #[serde(flatten)]
    pub execution: Execution,
    pub can_retry: bool,
}

impl ExecutionView {
    fn of(execution: Execution) -> Self {
        let can_retry = execution.status.is_failure()
            || execution.status == nebula_execution::ExecutionStatus::Cancelled;
        let can_retry = can_retry && execution.retry_count < execution.max_retries;
        Self { execution, can_retry }
    }
}

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StartExecutionRequest>,
) -> Result<Json<ExecutionView>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?;
    let execution = state
        .coordinator
        .start_execution(
            body.flow_id,
            body.version,
            body.input,
            body.context,
            user_id,
            nebula_execution::TriggerType::Manual,
        )
        .await?;
    Ok(Json(ExecutionView::of(execution)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ExecutionId>,
) -> Result<Json<ExecutionView>, ApiError> {
    let execution = state
        .executions
        .get(id)
        .await?
        .ok_or_else(|| nebula_error::NebulaError::execution_not_found(id))?;
    Ok(Json(ExecutionView::of(execution)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<ExecutionId>,
    headers: HeaderMap,
    Json(body): Json<CancelExecutionRequest>,
) -> Result<Json<ExecutionView>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?;
    let execution = state.coordinator.cancel_execution(id, body.reason, user_id).await?;
    Ok(Json(ExecutionView::of(execution)))
}

pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<ExecutionId>,
    headers: HeaderMap,
) -> Result<Json<ExecutionView>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?;
    let execution = state.coordinator.retry_execution(id, user_id).await?;
    Ok(Json(ExecutionView::of(execution)))
}

pub async fn resume(
    State(state): State<AppState>,
    Path(id): Path<ExecutionId>,
    headers: HeaderMap,
    Json(body): Json<ResumeExecutionRequest>,
) -> Result<Json<ExecutionView>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?;
    let execution = state.coordinator.resume_execution(id, body.data, user_id).await?;
    Ok(Json(ExecutionView::of(execution)))
}

/// Resolve a flow's published version, used by webhook/form/schedule ingress
/// before handing off to `start_execution` with an explicit version lock.
pub(crate) async fn require_published(state: &AppState, flow_id: FlowId) -> Result<u32, nebula_error::NebulaError> {
    state
        .flows
        .get_latest(flow_id)
        .await?
        .map(|flow| flow.version)
        .ok_or_else(|| nebula_error::NebulaError::no_published_version(flow_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_execution::{Execution, ExecutionStatus, TriggerType};
    use nebula_core::NodeId;

    fn exec_with(status: ExecutionStatus, retry_count: u32, max_retries: u32) -> Execution {
        let mut e = Execution::new(
            ExecutionId::v4(),
            FlowId::v4(),
            1,
            TriggerType::Manual,
            Value::Null,
            &[NodeId::v4()],
            max_retries,
        );
        e.status = status;
        e.retry_count = retry_count;
        e
    }

    #[test]
    fn can_retry_true_for_failed_under_budget() {
        let view = ExecutionView::of(exec_with(ExecutionStatus::Failed, 0, 3));
        assert!(view.can_retry);
    }

    #[test]
    fn can_retry_false_once_budget_exhausted() {
        let view = ExecutionView::of(exec_with(ExecutionStatus::Failed, 3, 3));
        assert!(!view.can_retry);
    }

    #[test]
    fn can_retry_false_for_completed() {
        let view = ExecutionView::of(exec_with(ExecutionStatus::Completed, 0, 3));
        assert!(!view.can_retry);
    }

    #[test]
    fn can_retry_true_for_cancelled_under_budget() {
        let view = ExecutionView::of(exec_with(ExecutionStatus::Cancelled, 0, 3));
        assert!(view.can_retry);
    }
}
