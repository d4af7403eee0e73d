//! The Execution Coordinator: owns a single execution end to end.
//!
//! `start_execution`/`resume_execution`/`cancel_execution`/`retry_execution`
//! are the four public entrypoints; everything else in this module is the
//! scheduling loop (`drive`) they hand off to. Unlike a scheduler that
//! precomputes a flat parallel-groups plan up front, `drive` walks
//! readiness waves computed fresh by [`crate::scheduler`] on every pass,
//! since handle suppression means the ready set here can only be known
//! once upstream nodes have actually run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use nebula_action::{HandlerRegistry, NodeHandler, NodeResult, ResumeCondition};
use nebula_core::{ExecutionId, FlowId, NodeId, UserId};
use nebula_error::{ErrorKind, NebulaError};
use nebula_execution::{Execution, ExecutionStatus, NodeAttempt, NodeExecutionState, TriggerType};
use nebula_store::{ExecutionRepo, FlowRepo};
use nebula_telemetry::event::{EventBus, ExecutionEvent};
use nebula_workflow::{DependencyGraph, FlowDefinition, NodeState};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::backoff;
use crate::dispatcher::{self, DispatchTask, DEFAULT_TIMEOUT};
use crate::scheduler::{self, NodeOutcome};
use crate::template::{self, TemplateRoots};

/// Per-node retry ceiling used when a handler does not declare its own.
///
/// Handler-declared `maxRetries` is resolved against an execution-level
/// safety cap; since no handler in this tree declares a per-node override
/// yet, every node currently uses this constant. The seam is
/// `Execution.max_retries`, already plumbed through to the retry check
/// below, so a handler-declared override only needs to flow into that field
/// once a handler surface for it exists.
const NODE_RETRY_CAP: u32 = 3;

/// Coordinates the lifecycle of every execution in the process.
///
/// One `Coordinator` is shared process-wide (see spec's singleton-collaborator
/// design note); it holds no per-execution state itself beyond the
/// in-flight cancellation tokens, so a paused execution costs nothing here —
/// resuming it rehydrates everything from `executions`.
pub struct Coordinator {
    flows: Arc<dyn FlowRepo>,
    executions: Arc<dyn ExecutionRepo>,
    handlers: Arc<HandlerRegistry>,
    events: Arc<EventBus>,
    semaphore: Arc<Semaphore>,
    node_timeout: Duration,
    cancellations: DashMap<ExecutionId, CancellationToken>,
}

impl Coordinator {
    /// Construct a coordinator bounded to `max_concurrent_nodes` simultaneous dispatches.
    #[must_use]
    pub fn new(
        flows: Arc<dyn FlowRepo>,
        executions: Arc<dyn ExecutionRepo>,
        handlers: Arc<HandlerRegistry>,
        events: Arc<EventBus>,
        max_concurrent_nodes: usize,
    ) -> Self {
        Self {
            flows,
            executions,
            handlers,
            events,
            semaphore: Arc::new(Semaphore::new(max_concurrent_nodes.max(1))),
            node_timeout: DEFAULT_TIMEOUT,
            cancellations: DashMap::new(),
        }
    }

    /// Override the per-node dispatch timeout (defaults to 60s).
    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    /// Start a new execution of `flow_id` and run it until it pauses or terminates.
    pub async fn start_execution(
        &self,
        flow_id: FlowId,
        version: Option<u32>,
        trigger_input: Value,
        trigger_context: Value,
        triggered_by: Option<UserId>,
        trigger_type: TriggerType,
    ) -> Result<Execution, NebulaError> {
        let flow = self.load_flow(flow_id, version).await?;

        let node_ids: Vec<NodeId> = flow.nodes.iter().map(|n| n.id).collect();
        let execution = Execution::new(
            ExecutionId::v4(),
            flow_id,
            flow.version,
            trigger_type,
            trigger_input,
            &node_ids,
            NODE_RETRY_CAP,
        )
        .with_triggered_by(triggered_by)
        .with_trigger_context(trigger_context);

        self.executions.create(execution.clone()).await?;
        self.events.emit(ExecutionEvent::Started {
            execution_id: execution.id.to_string(),
            flow_id: flow_id.to_string(),
        });

        self.drive(execution.id, flow).await
    }

    /// Resume a paused execution with the data the wait condition was expecting.
    pub async fn resume_execution(
        &self,
        execution_id: ExecutionId,
        resume_data: Value,
        resumer_user_id: Option<UserId>,
    ) -> Result<Execution, NebulaError> {
        let mut execution = self.require_execution(execution_id).await?;
        if execution.status != ExecutionStatus::Paused {
            return Err(NebulaError::not_paused(execution_id));
        }
        let Some(waiting_node_id) = execution.waiting_node_id else {
            return Err(NebulaError::wait_mismatch("<none>"));
        };

        let flow = self.load_flow(execution.flow_id, Some(execution.flow_version)).await?;

        let version = execution.version;
        execution.transition_status(ExecutionStatus::Running)?;
        self.complete_node(&mut execution, waiting_node_id, resume_data, Vec::new());
        let _ = resumer_user_id; // surfaced via ExecutionEvent::Resumed; no per-field home on Execution yet
        self.events.emit(ExecutionEvent::Resumed {
            execution_id: execution_id.to_string(),
            node_id: waiting_node_id.to_string(),
        });

        if !self.executions.cas_update(execution_id, version, execution.clone()).await? {
            return Err(NebulaError::dependency_failure("execution updated concurrently"));
        }

        self.drive(execution_id, flow).await
    }

    /// Request cancellation of a running or paused execution.
    pub async fn cancel_execution(
        &self,
        execution_id: ExecutionId,
        reason: impl Into<String> + Send,
        user_id: Option<UserId>,
    ) -> Result<Execution, NebulaError> {
        let mut execution = self.require_execution(execution_id).await?;
        let version = execution.version;

        execution.request_cancel(reason, user_id)?;
        if let Some(token) = self.cancellations.get(&execution_id) {
            token.cancel();
        }

        if execution.status == ExecutionStatus::Cancelling
            && execution.active_node_ids().is_empty()
        {
            execution.finish_cancel()?;
        }

        if !self.executions.cas_update(execution_id, version, execution.clone()).await? {
            return Err(NebulaError::dependency_failure("execution updated concurrently"));
        }
        if execution.status == ExecutionStatus::Cancelled {
            self.events.emit(ExecutionEvent::Cancelled {
                execution_id: execution_id.to_string(),
            });
        }
        Ok(execution)
    }

    /// Create a new execution that re-runs a terminal, retry-eligible execution.
    pub async fn retry_execution(
        &self,
        execution_id: ExecutionId,
        triggered_by: Option<UserId>,
    ) -> Result<Execution, NebulaError> {
        let original = self.require_execution(execution_id).await?;
        if !matches!(
            original.status,
            ExecutionStatus::Failed | ExecutionStatus::Cancelled | ExecutionStatus::TimedOut
        ) {
            return Err(NebulaError::already_terminal(execution_id));
        }
        if original.retry_count >= original.max_retries {
            return Err(NebulaError::new(
                ErrorKind::AlreadyTerminal,
                format!("execution '{execution_id}' exhausted its retry budget"),
            ));
        }

        let flow = self.load_flow(original.flow_id, Some(original.flow_version)).await?;
        let node_ids: Vec<NodeId> = flow.nodes.iter().map(|n| n.id).collect();

        let mut retry = Execution::new(
            ExecutionId::v4(),
            original.flow_id,
            original.flow_version,
            TriggerType::Retry,
            original.trigger_input.clone(),
            &node_ids,
            original.max_retries,
        )
        .with_triggered_by(triggered_by)
        .with_trigger_context(original.trigger_context.clone());
        retry.retry_of = Some(original.id);
        retry.retry_count = original.retry_count + 1;

        self.executions.create(retry.clone()).await?;
        self.events.emit(ExecutionEvent::Started {
            execution_id: retry.id.to_string(),
            flow_id: retry.flow_id.to_string(),
        });

        self.drive(retry.id, flow).await
    }

    async fn load_flow(&self, flow_id: FlowId, version: Option<u32>) -> Result<FlowDefinition, NebulaError> {
        match version {
            Some(v) => self
                .flows
                .get(flow_id, v)
                .await?
                .ok_or_else(|| NebulaError::flow_not_found(flow_id)),
            None => self
                .flows
                .get_latest(flow_id)
                .await?
                .ok_or_else(|| NebulaError::no_published_version(flow_id)),
        }
    }

    async fn require_execution(&self, execution_id: ExecutionId) -> Result<Execution, NebulaError> {
        self.executions
            .get(execution_id)
            .await?
            .ok_or_else(|| NebulaError::execution_not_found(execution_id))
    }

    /// Record a node's successful output directly into its execution state,
    /// without dispatching it. Used to inject `resumeData` as the waiting
    /// node's completed output (spec.md §4.3's resume contract).
    fn complete_node(
        &self,
        execution: &mut Execution,
        node_id: NodeId,
        output: Value,
        handles: Vec<String>,
    ) {
        if let Some(ns) = execution.node_states.get_mut(&node_id) {
            if ns.state == NodeState::Paused {
                let _ = ns.transition_to(NodeState::Running);
            }
            let _ = ns.transition_to(NodeState::Completed);
            let output_bytes = serde_json::to_vec(&output).map(|b| b.len() as u64).unwrap_or(0);
            let mut attempt = NodeAttempt::new(
                ns.attempt_count() as u32,
                nebula_execution::IdempotencyKey::generate(execution.id, node_id, ns.attempt_count() as u32),
            );
            attempt.complete_success(output, output_bytes);
            attempt.set_handles(handles);
            ns.attempts.push(attempt);
            execution.total_output_bytes += output_bytes;
        }
    }

    /// Drive scheduling for `execution_id` until it pauses or reaches a terminal status.
    ///
    /// Reloads the execution fresh at entry so a caller that just mutated and
    /// persisted it (resume, retry) sees its own write.
    async fn drive(&self, execution_id: ExecutionId, flow: FlowDefinition) -> Result<Execution, NebulaError> {
        let mut execution = self.require_execution(execution_id).await?;
        let graph = DependencyGraph::build(&flow.nodes, &flow.edges);
        let node_defs: HashMap<NodeId, &nebula_workflow::NodeDef> =
            flow.nodes.iter().map(|n| (n.id, n)).collect();

        let cancel_token = self
            .cancellations
            .entry(execution_id)
            .or_insert_with(CancellationToken::new)
            .clone();

        if execution.status == ExecutionStatus::Created {
            let version = execution.version;
            execution.transition_status(ExecutionStatus::Running)?;
            self.persist(execution_id, version, &execution).await?;
        }

        loop {
            if execution.status != ExecutionStatus::Running {
                break;
            }
            if cancel_token.is_cancelled() {
                let version = execution.version;
                if execution.status == ExecutionStatus::Running {
                    execution.request_cancel("cancellation requested", execution.cancelled_by)?;
                }
                execution.finish_cancel()?;
                self.persist(execution_id, version, &execution).await?;
                self.events.emit(ExecutionEvent::Cancelled {
                    execution_id: execution_id.to_string(),
                });
                break;
            }

            let outcomes = build_outcomes(&execution, &node_defs);
            let pending: Vec<NodeId> = execution
                .node_states
                .iter()
                .filter(|(_, ns)| ns.state == NodeState::Pending)
                .map(|(&id, _)| id)
                .collect();
            let wave = scheduler::ready_and_skipped(&graph, &pending, &outcomes);

            for &node_id in &wave.skipped {
                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Skipped);
                }
            }

            if wave.ready.is_empty() {
                let no_active = execution.active_node_ids().is_empty();
                let no_paused = execution
                    .node_states
                    .values()
                    .all(|ns| ns.state != NodeState::Paused);
                if no_active && no_paused {
                    let version = execution.version;
                    if execution.all_nodes_terminal() {
                        execution.transition_status(ExecutionStatus::Completed)?;
                    } else {
                        // Nothing ready, nothing active, but some node is
                        // neither terminal nor paused: an unreachable node
                        // with a cycle-free graph cannot occur post-publish
                        // validation, so this only happens if every
                        // remaining node is itself paused, already handled
                        // above — kept as a defensive completion fallback.
                        execution.transition_status(ExecutionStatus::Completed)?;
                    }
                    self.persist(execution_id, version, &execution).await?;
                    let duration = execution
                        .started_at
                        .and_then(|s| execution.completed_at.map(|c| c - s))
                        .and_then(|d| d.to_std().ok())
                        .unwrap_or_default();
                    self.events.emit(ExecutionEvent::Completed {
                        execution_id: execution_id.to_string(),
                        duration,
                    });
                    break;
                }
                // Active nodes are running out-of-band in a previous wave's
                // dispatch (shouldn't happen in this single-threaded drive
                // loop, kept for clarity) or something is paused; either way
                // there's nothing more this pass can schedule.
                break;
            }

            for &node_id in &wave.ready {
                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Ready);
                }
            }

            let node_outputs = collect_outputs(&execution);
            let mut join_set = JoinSet::new();
            let mut task_node_ids: HashMap<tokio::task::Id, NodeId> = HashMap::new();
            for &node_id in &wave.ready {
                let Some(def) = node_defs.get(&node_id) else {
                    continue;
                };
                let Some(handler) = self.handlers.get(&def.node_type) else {
                    if let Some(ns) = execution.node_states.get_mut(&node_id) {
                        let _ = ns.transition_to(NodeState::Running);
                        let _ = ns.transition_to(NodeState::Failed);
                        ns.error_message = Some(format!("no handler registered for '{}'", def.node_type));
                    }
                    continue;
                };

                let input_data = scheduler::resolve_input(&graph, node_id, &outcomes, &node_outputs);
                let previous_outputs = Value::Object(
                    node_outputs
                        .iter()
                        .map(|(id, v)| (id.to_string(), v.clone()))
                        .collect(),
                );
                let config = template::substitute(
                    &def.config,
                    TemplateRoots {
                        input: &input_data,
                        nodes: &previous_outputs,
                        trigger: &execution.trigger_input,
                        env: &serde_json::to_value(&flow.settings).unwrap_or(Value::Null),
                    },
                );

                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Running);
                }

                let task = DispatchTask {
                    execution_id,
                    flow_id: flow.flow_id,
                    node_id,
                    node_type: def.node_type.clone(),
                    handler,
                    config,
                    input_data,
                    previous_outputs,
                    trigger_context: execution.trigger_context.clone(),
                    user_id: execution.triggered_by,
                    cancellation: cancel_token.child_token(),
                    semaphore: self.semaphore.clone(),
                    events: self.events.clone(),
                    timeout: self.node_timeout,
                };
                let handle = join_set.spawn(dispatcher::dispatch_node(task));
                task_node_ids.insert(handle.id(), node_id);
            }

            while let Some(joined) = join_set.join_next_with_id().await {
                let (node_id, result) = match joined {
                    Ok((_task_id, pair)) => pair,
                    Err(join_err) => {
                        tracing::error!(?join_err, "node task panicked or was aborted");
                        let Some(&node_id) = task_node_ids.get(&join_err.id()) else {
                            continue;
                        };
                        (node_id, dispatcher::handler_crash_result(&join_err))
                    }
                };
                let continue_on_error = node_defs.get(&node_id).is_some_and(|d| d.continue_on_error);
                self.apply_result(&mut execution, node_id, result, continue_on_error).await;
            }

            if execution.status != ExecutionStatus::Running {
                let version_before_persist = execution.version;
                self.persist_if_changed(execution_id, version_before_persist, &execution).await?;
                break;
            }

            let version = execution.version;
            self.persist(execution_id, version, &execution).await?;
        }

        self.require_execution(execution_id).await
    }

    async fn apply_result(
        &self,
        execution: &mut Execution,
        node_id: NodeId,
        result: NodeResult,
        continue_on_error: bool,
    ) {
        match result {
            NodeResult::Success { output, handles } => {
                let output_bytes = serde_json::to_vec(&output).map(|b| b.len() as u64).unwrap_or(0);
                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let attempt_number = ns.attempt_count() as u32;
                    let mut attempt = NodeAttempt::new(
                        attempt_number,
                        nebula_execution::IdempotencyKey::generate(execution.id, node_id, attempt_number),
                    );
                    attempt.complete_success(output, output_bytes);
                    attempt.set_handles(handles);
                    ns.attempts.push(attempt);
                    let _ = ns.transition_to(NodeState::Completed);
                }
                execution.total_output_bytes += output_bytes;
            }
            NodeResult::Pause { reason, resume_condition } => {
                let condition_json = resume_condition_to_json(&resume_condition);
                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Paused);
                }
                let _ = execution.pause_on(node_id, reason, condition_json);
            }
            NodeResult::Failure { error_kind, message, retriable } => {
                let is_retriable = retriable.unwrap_or_else(|| error_kind.is_retryable());
                let attempt_count = execution
                    .node_states
                    .get(&node_id)
                    .map_or(0, NodeExecutionState::attempt_count) as u32;

                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let mut attempt = NodeAttempt::new(
                        attempt_count,
                        nebula_execution::IdempotencyKey::generate(execution.id, node_id, attempt_count),
                    );
                    attempt.complete_failure(message.clone());
                    ns.attempts.push(attempt);
                    ns.error_message = Some(message.clone());
                }

                if is_retriable && attempt_count < execution.max_retries {
                    execution.retry_count += 1;
                    if let Some(ns) = execution.node_states.get_mut(&node_id) {
                        // Back to Ready next wave; transition through the
                        // legal Running -> ... path is already satisfied
                        // since this node just ran. A fresh dispatch treats
                        // it as pending-turned-ready again via node_states
                        // directly rather than the scheduler (its upstream
                        // edges are already satisfied).
                        ns.state = NodeState::Pending;
                    }
                    tokio::time::sleep(backoff::next_retry_delay(attempt_count)).await;
                    return;
                }

                if let Some(ns) = execution.node_states.get_mut(&node_id) {
                    let _ = ns.transition_to(NodeState::Failed);
                }

                if continue_on_error {
                    return;
                }

                let _ = execution.fail(format!("node '{node_id}' failed: {message}"));
                let _ = error_kind;
            }
        }
    }

    async fn persist(&self, execution_id: ExecutionId, expected_version: u64, execution: &Execution) -> Result<(), NebulaError> {
        if !self
            .executions
            .cas_update(execution_id, expected_version, execution.clone())
            .await?
        {
            return Err(NebulaError::dependency_failure(format!(
                "execution '{execution_id}' updated concurrently"
            )));
        }
        Ok(())
    }

    async fn persist_if_changed(&self, execution_id: ExecutionId, expected_version: u64, execution: &Execution) -> Result<(), NebulaError> {
        self.persist(execution_id, expected_version, execution).await
    }
}

/// Build the `NodeOutcome` map the scheduler needs from current node states.
///
/// A node's live handles come straight from its latest attempt's recorded
/// `handles` (populated by `apply_result`/`complete_node` from the handler's
/// `NodeResult::Success.handles`); a node that continued past a non-retriable
/// failure under `continue_on_error` is treated as emitting only its declared
/// error handle, per spec.md §7.
fn build_outcomes(
    execution: &Execution,
    node_defs: &HashMap<NodeId, &nebula_workflow::NodeDef>,
) -> HashMap<NodeId, NodeOutcome> {
    let mut outcomes = HashMap::with_capacity(execution.node_states.len());
    for (&node_id, ns) in &execution.node_states {
        let outcome = match ns.state {
            NodeState::Completed => {
                NodeOutcome::Live(ns.latest_attempt().map(|a| a.handles.clone()).unwrap_or_default())
            }
            NodeState::Failed
                if node_defs.get(&node_id).is_some_and(|d| d.continue_on_error) =>
            {
                NodeOutcome::Live(vec!["error".to_string()])
            }
            NodeState::Skipped | NodeState::Failed | NodeState::Cancelled => NodeOutcome::Suppressed,
            _ => NodeOutcome::Pending,
        };
        outcomes.insert(node_id, outcome);
    }
    outcomes
}

fn collect_outputs(execution: &Execution) -> HashMap<NodeId, Value> {
    execution
        .node_states
        .iter()
        .filter_map(|(&id, ns)| {
            ns.latest_attempt()
                .filter(|a| a.is_success())
                .and_then(|a| a.output.clone())
                .map(|output| (id, output))
        })
        .collect()
}

fn resume_condition_to_json(condition: &ResumeCondition) -> Value {
    serde_json::to_value(condition).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_action::{InterfaceDefinition, NodeContext, NodeDescriptor, ValidationResult};
    use nebula_store::InMemoryStore;
    use nebula_workflow::{Edge, NodeDef};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct EchoHandler;

    #[async_trait]
    impl NodeHandler for EchoHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.echo".into(),
                name: "Echo".into(),
                description: "returns its input".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, ctx: NodeContext) -> NodeResult {
            NodeResult::success(ctx.config)
        }
    }

    struct StaticHandler(Value);

    #[async_trait]
    impl NodeHandler for StaticHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.static".into(),
                name: "Static".into(),
                description: "returns a fixed output".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, _ctx: NodeContext) -> NodeResult {
            NodeResult::success(self.0.clone())
        }
    }

    struct ApprovalHandler;

    #[async_trait]
    impl NodeHandler for ApprovalHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.approval".into(),
                name: "Approval".into(),
                description: "pauses for a decision".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, _ctx: NodeContext) -> NodeResult {
            NodeResult::Pause {
                reason: "needs sign-off".into(),
                resume_condition: ResumeCondition::Approval {
                    approval_id: "a-1".into(),
                },
            }
        }
    }

    struct FlakyHandler(Arc<AtomicU32>);

    #[async_trait]
    impl NodeHandler for FlakyHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.flaky".into(),
                name: "Flaky".into(),
                description: "fails twice, then succeeds".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, _ctx: NodeContext) -> NodeResult {
            let attempt = self.0.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                NodeResult::failure(ErrorKind::Timeout, "transient failure")
            } else {
                NodeResult::success(json!({"ok": true}))
            }
        }
    }

    struct PanicHandler;

    #[async_trait]
    impl NodeHandler for PanicHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.panic".into(),
                name: "Panic".into(),
                description: "panics instead of returning".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, _ctx: NodeContext) -> NodeResult {
            panic!("handler blew up");
        }
    }

    fn setup() -> (Coordinator, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(StaticHandler(json!({"y": 3}))));
        registry.register(Arc::new(ApprovalHandler));
        registry.register(Arc::new(FlakyHandler(Arc::new(AtomicU32::new(0)))));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8)
            .with_node_timeout(Duration::from_secs(5));
        (coordinator, store)
    }

    async fn publish_linear_flow(store: &InMemoryStore) -> FlowId {
        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let b = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![
                NodeDef::new(a, "test.echo").as_trigger(),
                NodeDef::new(b, "test.static"),
            ],
            edges: vec![Edge::new(a, b)],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();
        flow_id
    }

    #[tokio::test]
    async fn linear_flow_completes_and_records_output() {
        let (coordinator, store) = setup();
        let flow_id = publish_linear_flow(&store).await;
        let execution = coordinator
            .start_execution(flow_id, None, json!({"x": 2}), Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        let outputs: Vec<_> = execution
            .node_states
            .values()
            .filter_map(|ns| ns.latest_attempt().and_then(|a| a.output.clone()))
            .collect();
        assert!(outputs.contains(&json!({"y": 3})));
    }

    #[tokio::test]
    async fn approval_node_pauses_then_resumes_to_completion() {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(ApprovalHandler));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8);

        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let b = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![
                NodeDef::new(a, "test.echo").as_trigger(),
                NodeDef::new(b, "test.approval"),
            ],
            edges: vec![Edge::new(a, b)],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let execution = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Paused);
        assert_eq!(execution.waiting_node_id, Some(b));

        let resumed = coordinator
            .resume_execution(execution.id, json!({"decision": "approved"}), None)
            .await
            .unwrap();
        assert_eq!(resumed.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn retriable_failure_eventually_succeeds() {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(FlakyHandler(Arc::new(AtomicU32::new(0)))));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8);

        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![NodeDef::new(a, "test.flaky").as_trigger()],
            edges: vec![],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let execution = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        let node = execution.node_states.get(&a).unwrap();
        assert_eq!(node.attempt_count(), 3);
    }

    #[tokio::test]
    async fn panicking_handler_fails_the_node_instead_of_hanging_the_execution() {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(PanicHandler));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8);

        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![NodeDef::new(a, "test.panic").as_trigger()],
            edges: vec![],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let execution = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Failed);
        let node = execution.node_states.get(&a).unwrap();
        assert_eq!(node.state, NodeState::Failed);
        let message = node.error_message.as_deref().unwrap_or_default();
        assert!(message.contains("handler panicked"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn retry_execution_creates_new_record_linked_to_original() {
        let (coordinator, store) = setup();
        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![NodeDef::new(a, "test.nonexistent").as_trigger()],
            edges: vec![],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let first = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();
        assert_eq!(first.status, ExecutionStatus::Failed);

        let retried = coordinator.retry_execution(first.id, None).await.unwrap();
        assert_eq!(retried.retry_of, Some(first.id));
        assert_eq!(retried.retry_count, 1);
    }

    #[tokio::test]
    async fn cancel_execution_on_paused_reaches_cancelled() {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(ApprovalHandler));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8);

        let flow_id = FlowId::v4();
        let a = NodeId::v4();
        let b = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![
                NodeDef::new(a, "test.echo").as_trigger(),
                NodeDef::new(b, "test.approval"),
            ],
            edges: vec![Edge::new(a, b)],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let execution = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Paused);

        let cancelled = coordinator
            .cancel_execution(execution.id, "no longer needed", None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
    }

    struct ConditionHandler(&'static str);

    #[async_trait]
    impl NodeHandler for ConditionHandler {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor {
                key: "test.condition".into(),
                name: "Condition".into(),
                description: "emits a single named handle".into(),
                category: "test".into(),
            }
        }
        fn config_schema(&self) -> Value {
            Value::Null
        }
        fn interface_definition(&self) -> InterfaceDefinition {
            InterfaceDefinition::default()
        }
        fn validate(&self, _config: &Value) -> ValidationResult {
            ValidationResult::ok()
        }
        async fn execute(&self, _ctx: NodeContext) -> NodeResult {
            NodeResult::success_on_handles(Value::Null, vec![self.0.to_string()])
        }
    }

    #[tokio::test]
    async fn conditional_branch_skips_the_node_on_the_unchosen_handle() {
        let store = Arc::new(InMemoryStore::new());
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(ConditionHandler("true")));
        registry.register(Arc::new(StaticHandler(json!({"y": 3}))));
        let events = Arc::new(EventBus::new(256));
        let coordinator = Coordinator::new(store.clone(), store.clone(), Arc::new(registry), events, 8);

        let flow_id = FlowId::v4();
        let trigger = NodeId::v4();
        let condition = NodeId::v4();
        let true_branch = NodeId::v4();
        let false_branch = NodeId::v4();
        let flow = FlowDefinition {
            flow_id,
            version: 1,
            nodes: vec![
                NodeDef::new(trigger, "test.echo").as_trigger(),
                NodeDef::new(condition, "test.condition"),
                NodeDef::new(true_branch, "test.static"),
                NodeDef::new(false_branch, "test.static"),
            ],
            edges: vec![
                Edge::new(trigger, condition),
                Edge::on_handle(condition, "true", true_branch),
                Edge::on_handle(condition, "false", false_branch),
            ],
            settings: Default::default(),
        };
        store.publish(flow).await.unwrap();

        let execution = coordinator
            .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
            .await
            .unwrap();

        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(
            execution.node_states.get(&true_branch).unwrap().state,
            NodeState::Completed
        );
        assert_eq!(
            execution.node_states.get(&false_branch).unwrap().state,
            NodeState::Skipped
        );
    }
}
