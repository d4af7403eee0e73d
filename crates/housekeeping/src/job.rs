//! `HousekeepingJob`: one bookkeeping row per archival/retention sweep run.
//!
//! The type here is pure state — no store, no clock beyond what callers pass
//! in. [`can_start`] is the "refuses to start if another run for the same
//! job type is running" rule from spec.md §4.7, kept as a standalone
//! function so the caller (the sweep runner in `nebula-api`) can apply it
//! against whatever page of in-flight jobs its store returns, without this
//! crate needing to know how jobs are persisted or queried.

use chrono::{DateTime, Utc};
use nebula_core::HousekeepingJobId;
use serde::{Deserialize, Serialize};

/// Which sweep a [`HousekeepingJob`] row is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Archive (or delete) terminal executions older than the retention window.
    ExecutionArchival,
    /// Prune archived execution history past its own, separate retention window.
    HistoryRetention,
    /// Prune activity/event logs past their retention window.
    ActivityLogRetention,
}

/// Lifecycle status of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// One execution of a housekeeping sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingJob {
    pub id: HousekeepingJobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived_count: u64,
    pub deleted_count: u64,
    pub error_message: Option<String>,
}

impl HousekeepingJob {
    /// Begin a new run. Callers must have already checked [`can_start`]
    /// against the currently in-flight jobs.
    #[must_use]
    pub fn start(kind: JobKind, now: DateTime<Utc>) -> Self {
        Self {
            id: HousekeepingJobId::v4(),
            kind,
            status: JobStatus::Running,
            started_at: now,
            completed_at: None,
            archived_count: 0,
            deleted_count: 0,
            error_message: None,
        }
    }

    pub fn complete(&mut self, archived_count: u64, deleted_count: u64, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.archived_count = archived_count;
        self.deleted_count = deleted_count;
        self.completed_at = Some(now);
    }

    pub fn fail(&mut self, error_message: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(now);
    }
}

/// `true` if no job of `kind` in `existing` is currently `Running`.
#[must_use]
pub fn can_start(kind: JobKind, existing: &[HousekeepingJob]) -> bool {
    !existing
        .iter()
        .any(|job| job.kind == kind && job.status == JobStatus::Running)
}

/// The cutoff timestamp for a retention window: rows older than this are eligible.
#[must_use]
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - chrono::Duration::days(retention_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_start_while_same_kind_is_running() {
        let running = HousekeepingJob::start(JobKind::ExecutionArchival, Utc::now());
        assert!(!can_start(JobKind::ExecutionArchival, &[running]));
    }

    #[test]
    fn can_start_when_same_kind_already_completed() {
        let mut job = HousekeepingJob::start(JobKind::ExecutionArchival, Utc::now());
        job.complete(10, 10, Utc::now());
        assert!(can_start(JobKind::ExecutionArchival, &[job]));
    }

    #[test]
    fn different_kinds_do_not_block_each_other() {
        let running = HousekeepingJob::start(JobKind::HistoryRetention, Utc::now());
        assert!(can_start(JobKind::ExecutionArchival, &[running]));
    }

    #[test]
    fn complete_records_counts_and_timestamp() {
        let mut job = HousekeepingJob::start(JobKind::ExecutionArchival, Utc::now());
        job.complete(5, 5, Utc::now());
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.archived_count, 5);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn fail_records_error_message() {
        let mut job = HousekeepingJob::start(JobKind::ExecutionArchival, Utc::now());
        job.fail("store unavailable", Utc::now());
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("store unavailable"));
    }

    #[test]
    fn retention_cutoff_subtracts_days() {
        let now = Utc::now();
        let cutoff = retention_cutoff(now, 30);
        assert_eq!((now - cutoff).num_days(), 30);
    }
}
