//! The unified [`NebulaError`] type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kind::ErrorKind;

/// The single error type returned by every fallible operation in the engine.
///
/// Carries a structured [`ErrorKind`] for programmatic handling (HTTP status
/// mapping, retry decisions) alongside a human-readable `message`. Field-level
/// validation detail, when present, rides in `fields`.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{message}")]
pub struct NebulaError {
    /// The structured error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Field-level validation errors, if any (handler config validation).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dot-path of the offending field within the config mapping.
    pub path: String,
    /// Description of the failure.
    pub message: String,
}

impl NebulaError {
    /// Construct an error of the given kind with a message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach field-level validation errors.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = fields;
        self
    }

    /// Returns `true` if retrying the operation that produced this error might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Shorthand for `ErrorKind::InvalidConfig`.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    /// Shorthand for `ErrorKind::UnknownNodeType`.
    #[must_use]
    pub fn unknown_node_type(node_type: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnknownNodeType,
            format!("no handler registered for node type '{node_type}'"),
        )
    }

    /// Shorthand for `ErrorKind::InvalidDefinition`.
    #[must_use]
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDefinition, message)
    }

    /// Shorthand for `ErrorKind::FlowNotFound`.
    #[must_use]
    pub fn flow_not_found(flow_id: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::FlowNotFound, format!("flow '{flow_id}' not found"))
    }

    /// Shorthand for `ErrorKind::ExecutionNotFound`.
    #[must_use]
    pub fn execution_not_found(execution_id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::ExecutionNotFound,
            format!("execution '{execution_id}' not found"),
        )
    }

    /// Shorthand for `ErrorKind::NoPublishedVersion`.
    #[must_use]
    pub fn no_published_version(flow_id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::NoPublishedVersion,
            format!("flow '{flow_id}' has no published version"),
        )
    }

    /// Shorthand for `ErrorKind::NotPaused`.
    #[must_use]
    pub fn not_paused(execution_id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotPaused,
            format!("execution '{execution_id}' is not paused"),
        )
    }

    /// Shorthand for `ErrorKind::AlreadyTerminal`.
    #[must_use]
    pub fn already_terminal(execution_id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::AlreadyTerminal,
            format!("execution '{execution_id}' already reached a terminal status"),
        )
    }

    /// Shorthand for `ErrorKind::AlreadyActed`.
    #[must_use]
    pub fn already_acted() -> Self {
        Self::new(ErrorKind::AlreadyActed, "this user already acted on this approval")
    }

    /// Shorthand for `ErrorKind::WaitMismatch`.
    #[must_use]
    pub fn wait_mismatch(expected: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::WaitMismatch,
            format!("execution is not waiting on node '{expected}'"),
        )
    }

    /// Shorthand for `ErrorKind::AlreadyResolved`.
    #[must_use]
    pub fn already_resolved() -> Self {
        Self::new(ErrorKind::AlreadyResolved, "this gate has already been resolved")
    }

    /// Shorthand for `ErrorKind::FormClosed`.
    #[must_use]
    pub fn form_closed() -> Self {
        Self::new(ErrorKind::FormClosed, "this form is no longer accepting submissions")
    }

    /// Shorthand for `ErrorKind::InvalidTransition`.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidTransition,
            format!("invalid transition from '{from}' to '{to}'"),
        )
    }

    /// Shorthand for `ErrorKind::SignatureInvalid`.
    #[must_use]
    pub fn signature_invalid() -> Self {
        Self::new(ErrorKind::SignatureInvalid, "webhook signature verification failed")
    }

    /// Shorthand for `ErrorKind::PayloadTooLarge`.
    #[must_use]
    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::new(
            ErrorKind::PayloadTooLarge,
            format!("payload exceeds the {limit_bytes}-byte limit"),
        )
    }

    /// Shorthand for `ErrorKind::Timeout`.
    #[must_use]
    pub fn timeout(operation: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::Timeout, format!("'{operation}' timed out"))
    }

    /// Shorthand for `ErrorKind::HandlerCrash`.
    #[must_use]
    pub fn handler_crash(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandlerCrash, detail)
    }

    /// Shorthand for `ErrorKind::DependencyFailure`.
    #[must_use]
    pub fn dependency_failure(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::DependencyFailure, detail)
    }

    /// Shorthand for `ErrorKind::Cancelled`.
    #[must_use]
    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, detail)
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NebulaError>;
