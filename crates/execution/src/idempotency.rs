//! Deterministic idempotency keys for node attempts.
//!
//! A retry must not duplicate the side effects of the attempt it replaces
//! when a handler is itself idempotent on this key (e.g. an HTTP node using
//! it as an `Idempotency-Key` header). The key is derived, not random, so a
//! redelivered dispatch (after a coordinator crash) recomputes the same
//! value rather than minting a new one.

use std::fmt;

use nebula_core::{ExecutionId, NodeId};
use serde::{Deserialize, Serialize};

/// A stable key identifying one `(execution, node, attempt)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derive the key for a given execution, node, and attempt number.
    #[must_use]
    pub fn generate(execution_id: ExecutionId, node_id: NodeId, attempt_number: u32) -> Self {
        Self(format!("{execution_id}:{node_id}:{attempt_number}"))
    }

    /// The key's string form, as sent to external systems.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_key() {
        let exec = ExecutionId::v4();
        let node = NodeId::v4();
        let a = IdempotencyKey::generate(exec, node, 0);
        let b = IdempotencyKey::generate(exec, node, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn different_attempt_numbers_differ() {
        let exec = ExecutionId::v4();
        let node = NodeId::v4();
        let a = IdempotencyKey::generate(exec, node, 0);
        let b = IdempotencyKey::generate(exec, node, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn display_matches_as_str() {
        let key = IdempotencyKey::generate(ExecutionId::v4(), NodeId::v4(), 2);
        assert_eq!(key.to_string(), key.as_str());
    }
}
