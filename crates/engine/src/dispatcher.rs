//! The node dispatcher: runs one node to completion (or timeout, or crash).
//!
//! Dispatch is a plain async function the coordinator spawns into a
//! [`tokio::task::JoinSet`] per concurrency level, semaphore-gated, with
//! panics surfacing through `JoinError` rather than unwinding into the
//! coordinator's own task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nebula_action::{NodeContext, NodeHandler, NodeResult};
use nebula_core::{ExecutionId, FlowId, NodeId, UserId};
use nebula_error::{ErrorKind, NebulaError};
use nebula_telemetry::event::{EventBus, ExecutionEvent};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Default handler timeout, used when the node's config does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything [`dispatch_node`] needs to run one node and report back.
pub struct DispatchTask {
    pub execution_id: ExecutionId,
    pub flow_id: FlowId,
    pub node_id: NodeId,
    pub node_type: String,
    pub handler: Arc<dyn NodeHandler>,
    pub config: Value,
    pub input_data: Value,
    pub previous_outputs: Value,
    pub trigger_context: Value,
    pub user_id: Option<UserId>,
    pub cancellation: CancellationToken,
    pub semaphore: Arc<Semaphore>,
    pub events: Arc<EventBus>,
    pub timeout: Duration,
}

/// Dispatch a single node: acquire a concurrency permit, enforce the
/// timeout, run the handler, and emit the matching lifecycle events.
///
/// Returns the node's [`NodeResult`] wrapped so the caller can tell a
/// handler-produced failure apart from a dispatcher-produced one (timeout,
/// cancellation, or — when collected out of a `JoinSet` — a panic).
pub async fn dispatch_node(task: DispatchTask) -> (NodeId, NodeResult) {
    let DispatchTask {
        execution_id,
        flow_id,
        node_id,
        node_type,
        handler,
        config,
        input_data,
        previous_outputs,
        trigger_context,
        user_id,
        cancellation,
        semaphore,
        events,
        timeout,
    } = task;

    let Ok(_permit) = semaphore.acquire().await else {
        return (
            node_id,
            NodeResult::failure(ErrorKind::DependencyFailure, "dispatcher semaphore closed"),
        );
    };

    if cancellation.is_cancelled() {
        return (
            node_id,
            NodeResult::failure(ErrorKind::Cancelled, "execution was cancelled before dispatch"),
        );
    }

    events.emit(ExecutionEvent::NodeStarted {
        execution_id: execution_id.to_string(),
        node_id: node_id.to_string(),
    });
    let started = Instant::now();

    let ctx = NodeContext::new(
        execution_id,
        node_id,
        flow_id,
        node_type,
        config,
        input_data,
        previous_outputs,
        trigger_context,
        user_id,
        cancellation.clone(),
    );

    let result = tokio::time::timeout(timeout, handler.execute(ctx)).await;
    let elapsed = started.elapsed();

    let result = match result {
        Ok(result) => result,
        Err(_) => NodeResult::from(NebulaError::timeout(format!("node '{node_id}'"))),
    };

    match &result {
        NodeResult::Success { .. } => {
            events.emit(ExecutionEvent::NodeCompleted {
                execution_id: execution_id.to_string(),
                node_id: node_id.to_string(),
                duration: elapsed,
            });
        }
        NodeResult::Failure { message, .. } => {
            events.emit(ExecutionEvent::NodeFailed {
                execution_id: execution_id.to_string(),
                node_id: node_id.to_string(),
                error: message.clone(),
            });
        }
        NodeResult::Pause { reason, .. } => {
            events.emit(ExecutionEvent::NodePaused {
                execution_id: execution_id.to_string(),
                node_id: node_id.to_string(),
                reason: reason.clone(),
            });
        }
    }

    (node_id, result)
}

/// Turn a `JoinSet`-reported panic into the `Failure` the coordinator treats
/// every other dispatch error as, so a crashing handler never takes down the
/// coordinator's own task.
#[must_use]
pub fn handler_crash_result(join_error: &tokio::task::JoinError) -> NodeResult {
    if join_error.is_cancelled() {
        NodeResult::failure(ErrorKind::Cancelled, "node task was cancelled")
    } else {
        NodeResult::failure(
            ErrorKind::HandlerCrash,
            format!("handler panicked: {join_error}"),
        )
    }
}
