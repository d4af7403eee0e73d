//! The per-node execution state machine.
//!
//! `NodeState` tracks where a single node is within one execution attempt.
//! It is distinct from [`crate::types::NodeDef`] (the static definition) and
//! from `nebula_execution::NodeExecution` (the persisted record) — this type
//! is the in-memory state the coordinator transitions as it schedules.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a single node within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Not yet reachable or its predecessors haven't all completed.
    Pending,
    /// All predecessors are complete on live handles; about to dispatch.
    Ready,
    /// The handler is currently executing.
    Running,
    /// The handler returned `Success`.
    Completed,
    /// The handler returned a terminal `Failure` (retries exhausted or non-retriable).
    Failed,
    /// All incoming edges were suppressed by upstream conditional handles.
    Skipped,
    /// The handler returned `Pause`; execution is waiting on this node.
    Paused,
    /// Cancellation was requested and the handler did not return within the grace period.
    Cancelled,
}

impl NodeState {
    /// Returns `true` if this state will never change again within the execution.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Skipped | Self::Cancelled
        )
    }

    /// Returns `true` if the node is presently consuming a worker slot.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Valid direct transitions out of this state.
    #[must_use]
    pub fn allowed_next(self) -> &'static [NodeState] {
        match self {
            Self::Pending => &[Self::Ready, Self::Skipped],
            Self::Ready => &[Self::Running],
            Self::Running => &[Self::Completed, Self::Failed, Self::Paused, Self::Cancelled],
            Self::Paused => &[Self::Running],
            Self::Completed | Self::Failed | Self::Skipped | Self::Cancelled => &[],
        }
    }

    /// Returns `true` if `self -> next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: NodeState) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
