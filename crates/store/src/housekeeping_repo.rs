//! Persistence port for housekeeping sweep bookkeeping rows.

use async_trait::async_trait;
use nebula_core::HousekeepingJobId;
use nebula_error::NebulaError;
use nebula_housekeeping::{HousekeepingJob, JobKind};

/// Persistence interface for [`HousekeepingJob`] rows.
#[async_trait]
pub trait HousekeepingJobRepo: Send + Sync {
    async fn create_job(&self, job: HousekeepingJob) -> Result<(), NebulaError>;

    async fn update_job(&self, job: HousekeepingJob) -> Result<(), NebulaError>;

    async fn get_job(&self, id: HousekeepingJobId) -> Result<Option<HousekeepingJob>, NebulaError>;

    /// Jobs of `kind` currently in flight, for the "refuses concurrent
    /// same-job-type runs" check (spec.md §4.7).
    async fn list_running_jobs(&self, kind: JobKind) -> Result<Vec<HousekeepingJob>, NebulaError>;
}
