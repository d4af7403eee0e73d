//! Node execution attempt tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::idempotency::IdempotencyKey;

/// A single attempt to execute a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttempt {
    /// Which attempt this is (0-indexed).
    pub attempt_number: u32,
    /// Idempotency key for this attempt.
    pub idempotency_key: IdempotencyKey,
    /// When this attempt started.
    pub started_at: DateTime<Utc>,
    /// When this attempt completed, if it has.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Output produced, if the attempt succeeded.
    #[serde(default)]
    pub output: Option<Value>,
    /// Error message, if the attempt failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Size of `output` serialized, in bytes — feeds `Execution::total_output_bytes`.
    #[serde(default)]
    pub output_bytes: u64,
    /// Output handles this attempt activated; empty means only the default
    /// (unnamed) handle is live. Drives the scheduler's edge-suppression
    /// check for the next wave (see `nebula_engine::scheduler::NodeOutcome`).
    #[serde(default)]
    pub handles: Vec<String>,
}

impl NodeAttempt {
    /// Start a new attempt.
    #[must_use]
    pub fn new(attempt_number: u32, idempotency_key: IdempotencyKey) -> Self {
        Self {
            attempt_number,
            idempotency_key,
            started_at: Utc::now(),
            completed_at: None,
            output: None,
            error: None,
            output_bytes: 0,
            handles: Vec::new(),
        }
    }

    /// Mark this attempt as successfully completed.
    pub fn complete_success(&mut self, output: Value, output_bytes: u64) {
        self.completed_at = Some(Utc::now());
        self.output = Some(output);
        self.output_bytes = output_bytes;
    }

    /// Record which output handles this attempt activated (branching nodes).
    pub fn set_handles(&mut self, handles: Vec<String>) {
        self.handles = handles;
    }

    /// Mark this attempt as failed.
    pub fn complete_failure(&mut self, error: impl Into<String>) {
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Returns `true` if this attempt has finished, successfully or not.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns `true` if this attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.output.is_some() && self.error.is_none()
    }

    /// Returns `true` if this attempt failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId};

    fn key() -> IdempotencyKey {
        IdempotencyKey::generate(ExecutionId::v4(), NodeId::v4(), 0)
    }

    #[test]
    fn new_attempt_is_incomplete() {
        let attempt = NodeAttempt::new(0, key());
        assert!(!attempt.is_complete());
        assert!(!attempt.is_success());
        assert!(!attempt.is_failure());
    }

    #[test]
    fn complete_success_sets_output_and_bytes() {
        let mut attempt = NodeAttempt::new(0, key());
        attempt.complete_success(serde_json::json!(42), 2);
        assert!(attempt.is_complete());
        assert!(attempt.is_success());
        assert_eq!(attempt.output_bytes, 2);
    }

    #[test]
    fn complete_failure_sets_error() {
        let mut attempt = NodeAttempt::new(1, key());
        attempt.complete_failure("connection timeout");
        assert!(attempt.is_failure());
        assert_eq!(attempt.error.as_deref(), Some("connection timeout"));
    }

    #[test]
    fn serde_roundtrip() {
        let mut attempt = NodeAttempt::new(0, key());
        attempt.complete_success(serde_json::json!({"ok": true}), 14);
        let json = serde_json::to_string(&attempt).unwrap();
        let back: NodeAttempt = serde_json::from_str(&json).unwrap();
        assert!(back.is_success());
        assert_eq!(back.output_bytes, 14);
    }
}
