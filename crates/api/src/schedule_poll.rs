//! The schedule ingress poller (spec.md §4.5): ticks every
//! `schedule_poll_interval`, asks each active [`nebula_trigger::Schedule`]
//! whether it's due, and calls `startExecution` for every one that fires.
//!
//! There is no separate Quartz-style job store here — `nebula_trigger::Schedule`
//! already carries its own `next_fire_at`, so "reload every active trigger at
//! process start" (spec.md §9) is just "read every row from `ScheduleRepo`
//! on the first tick", which this loop does naturally.

use std::time::Duration;

use nebula_execution::TriggerType;
use nebula_store::ScheduleRepo;
use serde_json::Value;
use tracing::{error, warn};

use crate::state::AppState;

/// Spawn the schedule poller. Runs until the process exits.
pub fn spawn_schedule_poller(state: AppState, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = poll_once(&state).await {
                error!(error = %err, "schedule poll tick failed");
            }
        }
    })
}

async fn poll_once(state: &AppState) -> Result<(), nebula_error::NebulaError> {
    let now = chrono::Utc::now();
    let schedules = state.schedules.list_active_schedules().await?;
    for mut schedule in schedules {
        if !schedule.poll_due(now) {
            continue;
        }
        state.schedules.update_schedule(schedule.clone()).await?;

        match state
            .coordinator
            .start_execution(
                schedule.flow_id,
                None,
                Value::Null,
                Value::Null,
                schedule.owner,
                TriggerType::Schedule,
            )
            .await
        {
            Ok(_) => {}
            Err(err) => warn!(
                flow_id = %schedule.flow_id,
                schedule_id = %schedule.id,
                error = %err,
                "scheduled execution failed to start"
            ),
        }
    }
    Ok(())
}
