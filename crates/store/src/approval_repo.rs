//! Persistence port for approval gates and the votes cast against them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nebula_approval::{ApprovalAction, ExecutionApproval};
use nebula_core::{ApprovalId, ExecutionId, NodeId};
use nebula_error::NebulaError;

/// Persistence interface for [`ExecutionApproval`] gates and their
/// [`ApprovalAction`] history.
///
/// `record_action` is the transactional heart of spec.md §4.2's "atomic
/// increment plus append" requirement: implementations must append the
/// action and persist the updated gate as one atomic step, and must reject
/// a duplicate `(approval_id, user_id)` pair with `ALREADY_ACTED` before
/// either side effect is visible.
///
/// Method names here are deliberately distinct from [`crate::ExecutionRepo`]/
/// [`crate::FlowRepo`]'s (`get_gate` not `get`, and so on) — `InMemoryStore`
/// implements every port in this crate, and a bare `store.get(...)` call
/// against that concrete type would otherwise be ambiguous between ports.
#[async_trait]
pub trait ApprovalRepo: Send + Sync {
    /// Insert a freshly created, still-pending gate.
    async fn create_gate(&self, approval: ExecutionApproval) -> Result<(), NebulaError>;

    /// Fetch a gate by id.
    async fn get_gate(&self, id: ApprovalId) -> Result<Option<ExecutionApproval>, NebulaError>;

    /// Fetch the (at most one) pending gate for an `(executionId, nodeId)` pair.
    async fn get_pending_gate_for_node(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Result<Option<ExecutionApproval>, NebulaError>;

    /// Append `action` and persist `updated` atomically. Errors with
    /// `ALREADY_ACTED` if `(action.approval_id, action.user_id)` was
    /// already recorded.
    async fn record_action(
        &self,
        action: ApprovalAction,
        updated: ExecutionApproval,
    ) -> Result<(), NebulaError>;

    /// List every still-pending gate whose `expires_at` is at or before `cutoff`.
    async fn list_pending_gates_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExecutionApproval>, NebulaError>;

    /// Persist a gate that resolved without a new vote (e.g. expiry).
    async fn update_gate(&self, approval: ExecutionApproval) -> Result<(), NebulaError>;

    /// All votes cast against one gate, in the order they were recorded.
    async fn actions_for(&self, approval_id: ApprovalId) -> Result<Vec<ApprovalAction>, NebulaError>;
}
