//! Form ingress: a form either starts a new execution (*form trigger*) or
//! resumes a waiting one (*in-flow form*, paired with an approval-style
//! `Pause{reason=form}`).
//!
//! [`FormTrigger`] owns the `canAcceptSubmission` invariant so the HTTP layer
//! never has to recompute it from raw fields; [`FormTrigger::record_submission`]
//! is the one place `submissionCount` is mutated.

use chrono::{DateTime, Utc};
use nebula_core::{ExecutionId, FlowId, FormSubmissionId, FormTriggerId, NodeId, UserId};
use nebula_error::NebulaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A form bound to `(flowId, nodeId)` that either starts or resumes
/// executions, depending on whether `node_id` is `None`.
///
/// `node_id = None` means this is a standalone form trigger (starts a new
/// execution on submit); `node_id = Some(_)` means it gates an in-flow form
/// node that a paused execution is waiting on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTrigger {
    pub id: FormTriggerId,
    pub flow_id: FlowId,
    pub node_id: Option<NodeId>,
    pub form_token: String,
    pub config: Value,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// `0` means unlimited.
    pub max_submissions: u64,
    pub submission_count: u64,
}

impl FormTrigger {
    /// Register a new form trigger. `form_token` must be unique across the
    /// whole deployment; uniqueness is enforced by the store, not here.
    #[must_use]
    pub fn new(
        flow_id: FlowId,
        node_id: Option<NodeId>,
        form_token: impl Into<String>,
        config: Value,
        expires_at: Option<DateTime<Utc>>,
        max_submissions: u64,
    ) -> Self {
        Self {
            id: FormTriggerId::v4(),
            flow_id,
            node_id,
            form_token: form_token.into(),
            config,
            is_active: true,
            expires_at,
            max_submissions,
            submission_count: 0,
        }
    }

    /// `canAcceptSubmission`: active, not expired, and under the submission cap.
    #[must_use]
    pub fn can_accept_submission(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && !self.is_expired(now)
            && (self.max_submissions == 0 || self.submission_count < self.max_submissions)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Record one submission. Errors with `FORM_CLOSED` if the form cannot
    /// currently accept submissions — callers must check this before doing
    /// any execution-starting side effect.
    pub fn record_submission(&mut self, now: DateTime<Utc>) -> Result<(), NebulaError> {
        if !self.can_accept_submission(now) {
            return Err(NebulaError::form_closed());
        }
        self.submission_count += 1;
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// One payload submitted against a [`FormTrigger`].
///
/// `execution_id`/`node_id` are set for in-flow forms (the submission
/// resumes that execution at that node) and `None` for a trigger-form
/// submission that is about to start a brand new execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: FormSubmissionId,
    pub form_trigger_id: FormTriggerId,
    pub execution_id: Option<ExecutionId>,
    pub node_id: Option<NodeId>,
    pub payload: Value,
    pub submitted_by: Option<UserId>,
    pub submitted_ip: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    #[must_use]
    pub fn new_trigger_submission(
        form_trigger_id: FormTriggerId,
        payload: Value,
        submitted_ip: Option<String>,
    ) -> Self {
        Self {
            id: FormSubmissionId::v4(),
            form_trigger_id,
            execution_id: None,
            node_id: None,
            payload,
            submitted_by: None,
            submitted_ip,
            submitted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn new_in_flow_submission(
        form_trigger_id: FormTriggerId,
        execution_id: ExecutionId,
        node_id: NodeId,
        payload: Value,
        submitted_by: Option<UserId>,
        submitted_ip: Option<String>,
    ) -> Self {
        Self {
            id: FormSubmissionId::v4(),
            form_trigger_id,
            execution_id: Some(execution_id),
            node_id: Some(node_id),
            payload,
            submitted_by,
            submitted_ip,
            submitted_at: Utc::now(),
        }
    }
}
