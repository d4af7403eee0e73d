//! The durable `Execution` entity: one run of one flow version.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nebula_core::{ExecutionId, FlowId, NodeId, UserId};
use nebula_error::NebulaError;
use nebula_workflow::NodeState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node_execution::NodeExecutionState;
use crate::status::ExecutionStatus;
use crate::transition::validate_execution_transition;
use crate::trigger::TriggerType;

/// One run of one published flow version.
///
/// This is the aggregate the coordinator persists through `nebula-store`;
/// `node_states` is the per-node detail, everything else is execution-wide
/// bookkeeping. `version` is bumped on every mutation and used as the CAS
/// token for optimistic-concurrency writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Unique identifier for this run.
    pub id: ExecutionId,
    /// The flow being executed.
    pub flow_id: FlowId,
    /// The published flow version this run locked onto at start.
    pub flow_version: u32,
    /// Current status.
    pub status: ExecutionStatus,
    /// How this execution was started.
    pub trigger_type: TriggerType,
    /// The user who started this execution, if any (absent for unattended triggers).
    #[serde(default)]
    pub triggered_by: Option<UserId>,
    /// The payload the trigger delivered (webhook body, form fields, ...).
    #[serde(default)]
    pub trigger_input: Value,
    /// Additional trigger metadata (headers, schedule fire time, ...).
    #[serde(default)]
    pub trigger_context: Value,
    /// Per-node execution states, keyed by node id.
    pub node_states: HashMap<NodeId, NodeExecutionState>,
    /// Optimistic concurrency version, bumped on every status transition.
    pub version: u64,
    /// When the execution record was created.
    pub created_at: DateTime<Utc>,
    /// When the execution transitioned into `Running` for the first time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution most recently transitioned into `Paused`.
    #[serde(default)]
    pub paused_at: Option<DateTime<Utc>>,
    /// Human-readable reason the waiting node paused, if `status == Paused`.
    #[serde(default)]
    pub pause_reason: Option<String>,
    /// What the coordinator is waiting on, mirroring `NodeResult::Pause::resume_condition`.
    #[serde(default)]
    pub resume_condition: Option<Value>,
    /// When cancellation was requested (set on entering `Cancelling`).
    #[serde(default)]
    pub cancel_requested_at: Option<DateTime<Utc>>,
    /// Caller-supplied reason for cancelling, if cancelled.
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// The user who requested cancellation, if any.
    #[serde(default)]
    pub cancelled_by: Option<UserId>,
    /// When the execution reached a terminal status.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Maximum retry attempts per node, absent any handler-declared override.
    pub max_retries: u32,
    /// Total retries consumed across all nodes so far.
    pub retry_count: u32,
    /// The execution this one was retried from, if created by `retryExecution`.
    #[serde(default)]
    pub retry_of: Option<ExecutionId>,
    /// The node this execution is paused on, if `status == Paused`.
    #[serde(default)]
    pub waiting_node_id: Option<NodeId>,
    /// The failure message, if `status` is a failure state.
    #[serde(default)]
    pub error: Option<String>,
    /// Sum of every node attempt's `output_bytes`.
    #[serde(default)]
    pub total_output_bytes: u64,
}

impl Execution {
    /// Start a new execution record in `Created` status.
    #[must_use]
    pub fn new(
        id: ExecutionId,
        flow_id: FlowId,
        flow_version: u32,
        trigger_type: TriggerType,
        trigger_input: Value,
        node_ids: &[NodeId],
        max_retries: u32,
    ) -> Self {
        let mut node_states = HashMap::with_capacity(node_ids.len());
        for &id in node_ids {
            node_states.insert(id, NodeExecutionState::new());
        }
        Self {
            id,
            flow_id,
            flow_version,
            status: ExecutionStatus::Created,
            trigger_type,
            trigger_input,
            triggered_by: None,
            trigger_context: Value::Null,
            node_states,
            version: 0,
            created_at: Utc::now(),
            started_at: None,
            paused_at: None,
            pause_reason: None,
            resume_condition: None,
            cancel_requested_at: None,
            cancel_reason: None,
            cancelled_by: None,
            completed_at: None,
            max_retries,
            retry_count: 0,
            retry_of: None,
            waiting_node_id: None,
            error: None,
            total_output_bytes: 0,
        }
    }

    /// Attach the user who triggered this execution, if any.
    #[must_use]
    pub fn with_triggered_by(mut self, user_id: Option<nebula_core::UserId>) -> Self {
        self.triggered_by = user_id;
        self
    }

    /// Attach trigger metadata (headers, schedule fire time, ...).
    #[must_use]
    pub fn with_trigger_context(mut self, context: Value) -> Self {
        self.trigger_context = context;
        self
    }

    /// Look up a node's execution state.
    #[must_use]
    pub fn node_state(&self, node_id: NodeId) -> Option<&NodeExecutionState> {
        self.node_states.get(&node_id)
    }

    /// Returns `true` if every node has reached a terminal state.
    #[must_use]
    pub fn all_nodes_terminal(&self) -> bool {
        self.node_states.values().all(|ns| ns.state.is_terminal())
    }

    /// Ids of nodes presently running.
    #[must_use]
    pub fn active_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state.is_active())
            .map(|(&id, _)| id)
            .collect()
    }

    /// Ids of nodes that completed successfully.
    #[must_use]
    pub fn completed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Completed)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Ids of nodes that failed.
    #[must_use]
    pub fn failed_node_ids(&self) -> Vec<NodeId> {
        self.node_states
            .iter()
            .filter(|(_, ns)| ns.state == NodeState::Failed)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Transition the execution-level status, validating and bumping `version`.
    pub fn transition_status(&mut self, new_status: ExecutionStatus) -> Result<(), NebulaError> {
        validate_execution_transition(self.status, new_status)?;
        self.status = new_status;
        self.version += 1;

        match new_status {
            ExecutionStatus::Running if self.started_at.is_none() => {
                self.started_at = Some(Utc::now());
            }
            ExecutionStatus::Paused => {
                self.paused_at = Some(Utc::now());
            }
            ExecutionStatus::Cancelling => {
                self.cancel_requested_at = Some(Utc::now());
            }
            _ => {}
        }
        if new_status.is_terminal() {
            self.completed_at = Some(Utc::now());
            self.waiting_node_id = None;
            self.pause_reason = None;
            self.resume_condition = None;
        }
        if new_status == ExecutionStatus::Running {
            // resuming clears the wait point; the coordinator re-dispatches it
            self.waiting_node_id = None;
            self.pause_reason = None;
            self.resume_condition = None;
        }

        Ok(())
    }

    /// Pause the execution because `node_id` returned `NodeResult::Pause`.
    pub fn pause_on(
        &mut self,
        node_id: NodeId,
        reason: impl Into<String>,
        resume_condition: Value,
    ) -> Result<(), NebulaError> {
        self.transition_status(ExecutionStatus::Paused)?;
        self.waiting_node_id = Some(node_id);
        self.pause_reason = Some(reason.into());
        self.resume_condition = Some(resume_condition);
        Ok(())
    }

    /// Mark the execution failed with the given message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), NebulaError> {
        self.transition_status(ExecutionStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Begin cancellation: `running`/`paused` → `cancelling`, draining in-flight nodes.
    pub fn request_cancel(
        &mut self,
        reason: impl Into<String>,
        user_id: Option<UserId>,
    ) -> Result<(), NebulaError> {
        self.transition_status(ExecutionStatus::Cancelling)?;
        self.cancel_reason = Some(reason.into());
        self.cancelled_by = user_id;
        Ok(())
    }

    /// Complete cancellation once every in-flight node has drained.
    pub fn finish_cancel(&mut self) -> Result<(), NebulaError> {
        self.transition_status(ExecutionStatus::Cancelled)
    }
}
