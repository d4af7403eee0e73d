//! Per-node execution state within a running workflow.

use chrono::{DateTime, Utc};
use nebula_error::NebulaError;
use nebula_workflow::NodeState;
use serde::{Deserialize, Serialize};

use crate::attempt::NodeAttempt;
use crate::transition::validate_node_transition;

/// The execution state of a single node within one execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecutionState {
    /// Current lifecycle state.
    pub state: NodeState,
    /// Every attempt made to execute this node, in order.
    pub attempts: Vec<NodeAttempt>,
    /// When this node was first marked ready to run.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When this node's first attempt started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When this node reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// The most recent failure message, if the node is currently failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl NodeExecutionState {
    /// A fresh state in `Pending`, with no attempts yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: NodeState::Pending,
            attempts: Vec::new(),
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// Number of attempts made so far.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// The most recent attempt, if any were made.
    #[must_use]
    pub fn latest_attempt(&self) -> Option<&NodeAttempt> {
        self.attempts.last()
    }

    /// Transition to a new state, validating the transition and stamping timestamps.
    pub fn transition_to(&mut self, new_state: NodeState) -> Result<(), NebulaError> {
        validate_node_transition(self.state, new_state)?;
        self.state = new_state;

        if new_state == NodeState::Ready {
            self.scheduled_at = Some(Utc::now());
        }
        if new_state == NodeState::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if new_state.is_terminal() {
            self.completed_at = Some(Utc::now());
        }

        Ok(())
    }
}

impl Default for NodeExecutionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_pending_with_no_attempts() {
        let state = NodeExecutionState::new();
        assert_eq!(state.state, NodeState::Pending);
        assert_eq!(state.attempt_count(), 0);
        assert!(state.latest_attempt().is_none());
    }

    #[test]
    fn transition_through_lifecycle_stamps_timestamps() {
        let mut state = NodeExecutionState::new();
        state.transition_to(NodeState::Ready).unwrap();
        assert!(state.scheduled_at.is_some());

        state.transition_to(NodeState::Running).unwrap();
        assert!(state.started_at.is_some());

        state.transition_to(NodeState::Completed).unwrap();
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let mut state = NodeExecutionState::new();
        let err = state.transition_to(NodeState::Completed).unwrap_err();
        assert_eq!(err.kind, nebula_error::ErrorKind::InvalidTransition);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut state = NodeExecutionState::new();
        state.transition_to(NodeState::Ready).unwrap();
        state.transition_to(NodeState::Running).unwrap();
        state.transition_to(NodeState::Paused).unwrap();
        assert!(state.completed_at.is_none());
        state.transition_to(NodeState::Running).unwrap();
        assert_eq!(state.state, NodeState::Running);
    }
}
