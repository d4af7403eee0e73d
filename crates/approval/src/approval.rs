//! `ExecutionApproval`: the durable row behind a `Pause{reason=approval}` node.
//!
//! Resolution logic (`any`/`all`/`majority`) lives on the struct itself so
//! [`crate::gate::ApprovalGate`] only has to apply the store's CAS update and
//! react to the `Resolution` it's told about — the vote-counting arithmetic
//! is plain, synchronous, and unit-testable in isolation.

use chrono::{DateTime, Utc};
use nebula_core::{ApprovalId, ExecutionId, NodeId, UserId};
use serde::{Deserialize, Serialize};

/// How many approvals/rejections resolve the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// The first vote of either kind resolves the gate.
    Any,
    /// Approved once `approved_count >= required_approvers`; rejected on the
    /// first rejection.
    All,
    /// Approved once `approved_count > required_approvers / 2`, likewise for rejection.
    Majority,
}

/// Terminal or pending state of an [`ExecutionApproval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Cancelled,
}

impl ApprovalStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// An approval gate for one `(executionId, nodeId)` pause point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionApproval {
    pub id: ApprovalId,
    pub execution_id: ExecutionId,
    pub node_id: NodeId,
    pub mode: ApprovalMode,
    pub required_approvers: u32,
    pub status: ApprovalStatus,
    pub approved_count: u32,
    pub rejected_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// What recording one vote did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Still waiting on more votes.
    StillPending,
    /// The gate just resolved; carries the terminal decision.
    Resolved(Decision),
}

/// The terminal decision an approval (or its expiry) reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
    Expired,
}

impl ExecutionApproval {
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        node_id: NodeId,
        mode: ApprovalMode,
        required_approvers: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: ApprovalId::v4(),
            execution_id,
            node_id,
            mode,
            required_approvers: required_approvers.max(1),
            status: ApprovalStatus::Pending,
            approved_count: 0,
            rejected_count: 0,
            expires_at,
            resolved_at: None,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ApprovalStatus::Pending && self.expires_at.is_some_and(|at| at <= now)
    }

    /// Apply one vote's count and re-evaluate the resolution mode.
    ///
    /// Callers are responsible for the duplicate-`(approvalId, userId)`
    /// check (`ALREADY_ACTED`) and for appending the [`crate::action::ApprovalAction`]
    /// row — this only owns the counter/status arithmetic.
    pub fn record_vote(&mut self, approved: bool, now: DateTime<Utc>) -> Resolution {
        debug_assert_eq!(self.status, ApprovalStatus::Pending, "caller must check status first");
        if approved {
            self.approved_count += 1;
        } else {
            self.rejected_count += 1;
        }

        let decision = match self.mode {
            ApprovalMode::Any => {
                if approved {
                    Some(Decision::Approved)
                } else {
                    Some(Decision::Rejected)
                }
            }
            ApprovalMode::All => {
                if self.approved_count >= self.required_approvers {
                    Some(Decision::Approved)
                } else if self.rejected_count > 0 {
                    Some(Decision::Rejected)
                } else {
                    None
                }
            }
            ApprovalMode::Majority => {
                let half = self.required_approvers / 2;
                if self.approved_count > half {
                    Some(Decision::Approved)
                } else if self.rejected_count > half {
                    Some(Decision::Rejected)
                } else {
                    None
                }
            }
        };

        let Some(decision) = decision else {
            return Resolution::StillPending;
        };
        self.status = match decision {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
            Decision::Expired => ApprovalStatus::Expired,
        };
        self.resolved_at = Some(now);
        Resolution::Resolved(decision)
    }

    /// Expire a still-pending gate. No-op (returns `StillPending`) if it
    /// already resolved through voting before the sweeper got to it.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Resolution {
        if self.status.is_terminal() {
            return Resolution::StillPending;
        }
        self.status = ApprovalStatus::Expired;
        self.resolved_at = Some(now);
        Resolution::Resolved(Decision::Expired)
    }
}
