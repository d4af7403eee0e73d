//! The value a node handler returns to the dispatcher.

use nebula_error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Condition the coordinator waits on before resuming a paused node.
///
/// Mirrors the gates described in spec.md §4/§5: a node pauses either for a
/// human approval, a form submission, or a timer, and resumes when that
/// event lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResumeCondition {
    /// Resume once the named approval reaches a terminal decision.
    Approval {
        /// Identifier of the approval gate to wait on, as a string (see `nebula-approval`).
        approval_id: String,
    },
    /// Resume once the named form is submitted.
    Form {
        /// Opaque form token the submission must present.
        form_token: String,
    },
    /// Resume automatically once the deadline passes, with no external event.
    Timer {
        /// Unix milliseconds at which the coordinator should wake this node.
        resume_at_ms: i64,
    },
}

/// The outcome of dispatching a single node.
///
/// The coordinator matches on this to decide what happens next: advance
/// dependents on `Success`, persist a wait point on `Pause`, or apply the
/// retry/backoff policy on `Failure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeResult {
    /// The node produced output and execution may continue downstream.
    Success {
        /// The node's output, addressable by downstream templates as `{{nodes.<id>.output}}`.
        output: Value,
        /// Output handles this invocation activated (empty means the default handle).
        #[serde(default)]
        handles: Vec<String>,
    },
    /// The node cannot proceed without an external event.
    Pause {
        /// Human-readable reason, surfaced in execution status responses.
        reason: String,
        /// What the coordinator should wait for before resuming this node.
        resume_condition: ResumeCondition,
    },
    /// The node failed.
    Failure {
        /// Structured error kind, used for the retry decision and API responses.
        error_kind: ErrorKind,
        /// Human-readable failure message.
        message: String,
        /// Handler-declared override of whether this particular failure is worth retrying.
        ///
        /// `None` defers to `error_kind.is_retryable()`.
        #[serde(default)]
        retriable: Option<bool>,
    },
}

impl From<nebula_error::NebulaError> for NodeResult {
    /// A dispatcher-level failure (timeout, cancellation, ...) reported the
    /// same way a handler-returned `Failure` is.
    fn from(err: nebula_error::NebulaError) -> Self {
        let retriable = Some(err.is_retryable());
        Self::Failure {
            error_kind: err.kind,
            message: err.message,
            retriable,
        }
    }
}

impl NodeResult {
    /// Construct a `Success` with the default handle and no extra outputs.
    #[must_use]
    pub fn success(output: Value) -> Self {
        Self::Success {
            output,
            handles: Vec::new(),
        }
    }

    /// Construct a `Success` that activates specific named handles (branching).
    #[must_use]
    pub fn success_on_handles(output: Value, handles: Vec<String>) -> Self {
        Self::Success { output, handles }
    }

    /// Construct a `Failure` using the error kind's own retry policy.
    #[must_use]
    pub fn failure(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            error_kind,
            message: message.into(),
            retriable: None,
        }
    }

    /// Whether the coordinator should schedule a retry for this result.
    ///
    /// Only meaningful for `Failure`; `Success` and `Pause` are never retried.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Failure {
                error_kind,
                retriable,
                ..
            } => retriable.unwrap_or_else(|| error_kind.is_retryable()),
            Self::Success { .. } | Self::Pause { .. } => false,
        }
    }
}
