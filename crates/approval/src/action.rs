//! `ApprovalAction`: one immutable vote against an [`crate::approval::ExecutionApproval`].

use chrono::{DateTime, Utc};
use nebula_core::{ApprovalId, UserId};
use serde::{Deserialize, Serialize};

/// The two things a user can do to an approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Reject,
}

impl ActionKind {
    #[must_use]
    pub fn is_approve(self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// One recorded vote. `(approval_id, user_id)` is unique and enforced by the
/// store at append time (`ALREADY_ACTED`), not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub approval_id: ApprovalId,
    pub user_id: UserId,
    pub action: ActionKind,
    pub comment: Option<String>,
    pub acted_at: DateTime<Utc>,
}

impl ApprovalAction {
    #[must_use]
    pub fn new(approval_id: ApprovalId, user_id: UserId, action: ActionKind, comment: Option<String>) -> Self {
        Self {
            approval_id,
            user_id,
            action,
            comment,
            acted_at: Utc::now(),
        }
    }
}
