//! # Nebula Core
//!
//! Strongly-typed identifiers shared by every crate in the workflow engine.
//! Kept deliberately small: this crate has no knowledge of workflows,
//! executions, or actions — only the identifiers that name them.

pub mod id;

pub use id::*;

/// Common prelude for Nebula crates.
pub mod prelude {
    pub use crate::id::{
        ApprovalId, ExecutionId, FlowId, FormSubmissionId, FormTriggerId, HousekeepingJobId, NodeId,
        ScheduleId, UserId, UuidParseError, WebhookId,
    };
}
