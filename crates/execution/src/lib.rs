//! Durable execution state: the `Execution` aggregate, per-node state,
//! attempt history, and the state-machine transitions that guard them.
//!
//! This crate has no opinion on how state gets persisted (`nebula-store`) or
//! how nodes get scheduled (`nebula-engine`) — it only defines the shape of
//! the state and which transitions are legal.

mod attempt;
mod execution;
mod idempotency;
mod node_execution;
mod status;
mod transition;
mod trigger;

pub use attempt::NodeAttempt;
pub use execution::Execution;
pub use idempotency::IdempotencyKey;
pub use node_execution::NodeExecutionState;
pub use status::ExecutionStatus;
pub use transition::{
    can_transition_execution, can_transition_node, validate_execution_transition,
    validate_node_transition,
};
pub use trigger::TriggerType;

/// Common prelude for crates that work with durable execution state.
pub mod prelude {
    pub use crate::{
        Execution, ExecutionStatus, IdempotencyKey, NodeAttempt, NodeExecutionState, TriggerType,
    };
}
