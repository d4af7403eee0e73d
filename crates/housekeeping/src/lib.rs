//! Housekeeping bookkeeping: the `HousekeepingJob` row and the pure rules
//! around it (spec.md §4.7) — same-kind run exclusion and retention-window
//! cutoff computation. The sweep loop itself (reading due executions from
//! the store, archiving/deleting them in batches, persisting this crate's
//! job row) is driven by `nebula-api`, which is where the cron schedule and
//! the store handle both live.

mod job;

pub use job::{HousekeepingJob, JobKind, JobStatus, can_start, retention_cutoff};

/// Common prelude for crates that run or observe housekeeping sweeps.
pub mod prelude {
    pub use crate::{HousekeepingJob, JobKind, JobStatus, can_start, retention_cutoff};
}
