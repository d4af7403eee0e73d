//! Persistence port for durable execution state.

use chrono::{DateTime, Utc};
use async_trait::async_trait;
use nebula_core::ExecutionId;
use nebula_error::NebulaError;
use nebula_execution::Execution;

/// Persistence interface for workflow executions.
///
/// State is versioned (see [`Execution::version`]); mutation goes through
/// [`ExecutionRepo::cas_update`] so two coordinators racing to drive the same
/// execution (after a crash and requeue) cannot silently clobber each other.
#[async_trait]
pub trait ExecutionRepo: Send + Sync {
    /// Insert a brand new execution record. Errors if the id already exists.
    async fn create(&self, execution: Execution) -> Result<(), NebulaError>;

    /// Fetch an execution by id.
    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>, NebulaError>;

    /// Compare-and-swap the stored execution.
    ///
    /// Succeeds only if the stored record's `version` equals
    /// `expected_version`; returns `Ok(false)` on a version mismatch so the
    /// caller can re-read and retry rather than losing a concurrent update.
    async fn cas_update(
        &self,
        id: ExecutionId,
        expected_version: u64,
        new_state: Execution,
    ) -> Result<bool, NebulaError>;

    /// List executions in a terminal status that completed before `cutoff`,
    /// for housekeeping archival. Paginated via `offset`/`limit`.
    async fn list_for_archival(
        &self,
        cutoff: DateTime<Utc>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Execution>, NebulaError>;

    /// Permanently delete an execution record. Returns `true` if it existed.
    async fn delete(&self, id: ExecutionId) -> Result<bool, NebulaError>;
}
