//! Runtime context handed to a node handler at dispatch time.

use std::fmt;

use nebula_core::{ExecutionId, FlowId, NodeId, UserId};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A string that redacts its contents in `Debug` and `Display`.
///
/// Used wherever a resolved credential value flows through handler code, so
/// that an errant `tracing::debug!("{:?}", value)` cannot leak a secret.
#[derive(Clone)]
pub struct SecureString(String);

impl SecureString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value. Callers must not log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString(***)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Everything a node handler is given to do its job.
///
/// Built by the dispatcher in `nebula-engine` immediately before invoking a
/// handler; see spec.md §4.3's input-resolution step. Handlers must poll
/// [`NodeContext::is_cancelled`] in any loop that could run long, to honor
/// cooperative cancellation when an execution is cancelled mid-node.
#[non_exhaustive]
pub struct NodeContext {
    /// The execution this dispatch belongs to.
    pub execution_id: ExecutionId,
    /// The node being dispatched.
    pub node_id: NodeId,
    /// The flow the execution was started from.
    pub flow_id: FlowId,
    /// The handler key this node was registered under (`NodeDef.node_type`).
    pub node_type: String,
    /// The node's resolved configuration — `{{path}}` templates already substituted.
    pub config: Value,
    /// Merged input from this node's live predecessor outputs.
    pub input_data: Value,
    /// Raw outputs of every completed node so far, keyed by node id string.
    pub previous_outputs: Value,
    /// The trigger payload that started this execution.
    pub trigger_context: Value,
    /// The user who owns this execution, if any (absent for unattended triggers).
    pub user_id: Option<UserId>,
    /// Cancellation signal for cooperative cancellation.
    pub cancellation: CancellationToken,
}

impl NodeContext {
    /// Construct a context. `#[non_exhaustive]` keeps this the only way to
    /// build one outside this crate, so adding a field here never breaks a
    /// dispatcher built against an older version.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        execution_id: ExecutionId,
        node_id: NodeId,
        flow_id: FlowId,
        node_type: String,
        config: Value,
        input_data: Value,
        previous_outputs: Value,
        trigger_context: Value,
        user_id: Option<UserId>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            execution_id,
            node_id,
            flow_id,
            node_type,
            config,
            input_data,
            previous_outputs,
            trigger_context,
            user_id,
            cancellation,
        }
    }

    /// Returns `true` if the execution has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_string_redacts_debug_and_display() {
        let s = SecureString::new("top-secret");
        assert_eq!(format!("{s:?}"), "SecureString(***)");
        assert_eq!(format!("{s}"), "***");
        assert_eq!(s.expose(), "top-secret");
    }

    #[test]
    fn context_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = NodeContext {
            execution_id: ExecutionId::v4(),
            node_id: NodeId::v4(),
            flow_id: FlowId::v4(),
            node_type: "noop".into(),
            config: Value::Null,
            input_data: Value::Null,
            previous_outputs: Value::Null,
            trigger_context: Value::Null,
            user_id: None,
            cancellation: token.clone(),
        };
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
