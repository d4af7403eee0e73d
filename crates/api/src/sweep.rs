//! Background sweeps: housekeeping archival and pending-approval expiry
//! (spec.md §4.6's sweeper, §4.7). Both are plain `tokio::spawn`ed loops
//! over the same store `AppState` already wires into every request handler
//! — there is no separate worker process in this design; both sweeps are
//! spawned directly off of `main` rather than standing up a distinct binary.

use std::time::Duration;

use chrono::Utc;
use nebula_housekeeping::{HousekeepingJob, JobKind, can_start, retention_cutoff};
use nebula_store::{ApprovalRepo, ExecutionRepo, HousekeepingJobRepo};
use tracing::{error, info, warn};

use crate::state::AppState;

/// Spawn the housekeeping archival sweep, firing every `interval` and
/// archiving terminal executions older than `retention_days` in batches of
/// `batch_size`. Refuses to start a new run while one of the same
/// [`JobKind::ExecutionArchival`] is still `Running` (spec.md §4.7).
pub fn spawn_housekeeping_sweep(
    state: AppState,
    interval: Duration,
    retention_days: i64,
    batch_size: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = run_housekeeping_sweep(&state, retention_days, batch_size).await {
                error!(error = %err, "housekeeping sweep failed");
            }
        }
    })
}

async fn run_housekeeping_sweep(
    state: &AppState,
    retention_days: i64,
    batch_size: usize,
) -> Result<(), nebula_error::NebulaError> {
    let running = state.housekeeping_jobs.list_running_jobs(JobKind::ExecutionArchival).await?;
    if !can_start(JobKind::ExecutionArchival, &running) {
        warn!("housekeeping sweep skipped: a run is already in progress");
        return Ok(());
    }

    let now = Utc::now();
    let cutoff = retention_cutoff(now, retention_days);
    let mut job = HousekeepingJob::start(JobKind::ExecutionArchival, now);
    state.housekeeping_jobs.create_job(job.clone()).await?;

    let mut deleted = 0u64;
    loop {
        let batch = state.executions.list_for_archival(cutoff, 0, batch_size).await?;
        if batch.is_empty() {
            break;
        }
        for execution in &batch {
            state.executions.delete(execution.id).await?;
            deleted += 1;
        }
        if batch.len() < batch_size {
            break;
        }
    }

    job.complete(0, deleted, Utc::now());
    state.housekeeping_jobs.update_job(job).await?;
    info!(deleted_count = deleted, "housekeeping sweep completed");
    Ok(())
}

/// Spawn the pending-approval expiry sweeper: every `interval`, resolve any
/// gate whose `expires_at` has passed as `expired` and resume its execution
/// with `{decision: "expired"}` (spec.md §4.6).
pub fn spawn_approval_expiry_sweep(state: AppState, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = run_approval_expiry_sweep(&state).await {
                error!(error = %err, "approval expiry sweep failed");
            }
        }
    })
}

async fn run_approval_expiry_sweep(state: &AppState) -> Result<(), nebula_error::NebulaError> {
    let now = Utc::now();
    let expiring = state.approvals.list_pending_gates_expiring_before(now).await?;
    for mut gate in expiring {
        let resolution = gate.expire(now);
        if !matches!(resolution, nebula_approval::Resolution::Resolved(_)) {
            continue;
        }
        state.approvals.update_gate(gate.clone()).await?;

        let resume_data = serde_json::json!({"decision": "expired"});
        if let Err(err) = state
            .coordinator
            .resume_execution(gate.execution_id, resume_data, None)
            .await
        {
            error!(execution_id = %gate.execution_id, error = %err, "failed to resume execution after approval expiry");
        }
    }
    Ok(())
}
