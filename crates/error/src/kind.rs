//! The engine's error taxonomy.
//!
//! Kinds are grouped by concern: configuration mistakes, missing data,
//! invalid state transitions, auth/rate rejections, runtime failures, and
//! resource lookups. The grouping only matters for
//! [`ErrorKind::is_retryable`] and for the HTTP status mapping in
//! `nebula-api` — callers match on the specific variant, not the group.

use serde::{Deserialize, Serialize};

/// One entry in the engine's error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // -- Configuration --
    /// A node or workflow config value failed handler/schema validation.
    InvalidConfig,
    /// `NodeDef.type` has no registered handler.
    UnknownNodeType,
    /// The flow definition itself is structurally invalid (cycle, dangling edge, ...).
    InvalidDefinition,

    // -- Data --
    /// No flow exists with the given id.
    FlowNotFound,
    /// No execution exists with the given id.
    ExecutionNotFound,
    /// `startExecution` was called without a version and no version is published.
    NoPublishedVersion,

    // -- State --
    /// `resumeExecution` called on an execution that isn't paused.
    NotPaused,
    /// An operation that requires a non-terminal execution was given a terminal one.
    AlreadyTerminal,
    /// The same `(approvalId, userId)` acted twice.
    AlreadyActed,
    /// `resumeExecution`'s `waitingNodeId` didn't match the execution's actual wait point.
    WaitMismatch,
    /// A form or approval already resolved; the duplicate submission is a no-op.
    AlreadyResolved,
    /// A form trigger is inactive, expired, or past its submission cap.
    FormClosed,
    /// A node or execution state machine was asked to make an illegal transition.
    InvalidTransition,

    // -- Auth / rate --
    /// No valid credentials were presented.
    Unauthorized,
    /// Credentials were valid but insufficient.
    Forbidden,
    /// Webhook signature verification failed.
    SignatureInvalid,
    /// Request body exceeded the configured cap.
    PayloadTooLarge,
    /// Caller exceeded a rate limit.
    RateLimited,

    // -- Runtime --
    /// A node dispatch exceeded its timeout.
    Timeout,
    /// A handler panicked or returned an unexpected error.
    HandlerCrash,
    /// A collaborator (store, queue, ...) failed and retries were exhausted.
    DependencyFailure,
    /// The execution was cancelled before or during this node's dispatch.
    Cancelled,

    // -- Resource --
    /// `CredentialResolver` found no credential with the given id.
    CredentialNotFound,
    /// `CredentialResolver` found a credential whose key generation doesn't match.
    KeyMismatch,
}

impl ErrorKind {
    /// Returns `true` if an operation that failed with this kind is worth retrying.
    ///
    /// Used by the coordinator's node-retry decision (spec.md §4.3 step 4) and
    /// by the coordinator-level dependency-failure backoff (spec.md §7).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::DependencyFailure | Self::RateLimited
        )
    }

    /// A short machine-readable code, stable across releases, suitable for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::UnknownNodeType => "UNKNOWN_NODE_TYPE",
            Self::InvalidDefinition => "INVALID_DEFINITION",
            Self::FlowNotFound => "FLOW_NOT_FOUND",
            Self::ExecutionNotFound => "EXECUTION_NOT_FOUND",
            Self::NoPublishedVersion => "NO_PUBLISHED_VERSION",
            Self::NotPaused => "NOT_PAUSED",
            Self::AlreadyTerminal => "ALREADY_TERMINAL",
            Self::AlreadyActed => "ALREADY_ACTED",
            Self::WaitMismatch => "WAIT_MISMATCH",
            Self::AlreadyResolved => "ALREADY_RESOLVED",
            Self::FormClosed => "FORM_CLOSED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::HandlerCrash => "HANDLER_CRASH",
            Self::DependencyFailure => "DEPENDENCY_FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::CredentialNotFound => "CREDENTIAL_NOT_FOUND",
            Self::KeyMismatch => "KEY_MISMATCH",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
