//! Approval gate domain logic: the `any`/`all`/`majority` vote-counting state
//! machine behind a `Pause{reason=approval}` node (spec.md §4.6).
//!
//! This crate is deliberately inert — it owns no store, no coordinator, and
//! spawns no background task. [`approval::ExecutionApproval::record_vote`]
//! and [`approval::ExecutionApproval::expire`] are pure state transitions;
//! `nebula-api` is where a vote lands over HTTP, gets persisted through a
//! store port, and (on resolution) triggers `Coordinator::resume_execution`.
//! Keeping the arithmetic here, free of I/O, is what makes it exhaustively
//! unit-testable without a running engine.

mod action;
mod approval;

pub use action::{ActionKind, ApprovalAction};
pub use approval::{ApprovalMode, ApprovalStatus, Decision, ExecutionApproval, Resolution};

/// Common prelude for crates that work with approval gates.
pub mod prelude {
    pub use crate::{ActionKind, ApprovalAction, ApprovalMode, ApprovalStatus, Decision, ExecutionApproval, Resolution};
}
