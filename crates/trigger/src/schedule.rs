//! Schedule ingress: cron and interval triggers for flows.
//!
//! A [`Schedule`] tracks its own `next_fire_at`; [`Schedule::poll_due`] is the
//! one decision point the housekeeping-style scheduler loop calls on a tick.
//! Misfire policy is encoded in how `next_fire_at` advances: cron always
//! recomputes from `now`, firing once no matter how many boundaries were
//! missed (fire-and-proceed); interval adds its period to `now` rather than
//! to the missed `next_fire_at`, so a long pause doesn't queue a catch-up
//! burst (next-with-existing-count).

use std::str::FromStr;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use nebula_core::{FlowId, ScheduleId, UserId};
use nebula_error::NebulaError;
use serde::{Deserialize, Serialize};

/// Interval schedules must fire no more often than once per 10 seconds.
pub const MIN_INTERVAL_MS: i64 = 10_000;

/// The two ways a [`Schedule`] can be driven.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleKind {
    Cron { expression: String, timezone: String },
    Interval { interval_ms: i64 },
}

/// A recurring trigger for one flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub flow_id: FlowId,
    pub owner: Option<UserId>,
    pub kind: ScheduleKind,
    pub paused: bool,
    pub fire_count: u64,
    pub next_fire_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Build a cron schedule. Validates both the cron expression and the
    /// timezone name eagerly, so a malformed schedule is never persisted.
    pub fn cron(
        flow_id: FlowId,
        owner: Option<UserId>,
        expression: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Result<Self, NebulaError> {
        let expression = expression.into();
        let timezone = timezone.into();
        validate_cron_expression(&expression)?;
        validate_timezone(&timezone)?;
        let mut schedule = Self {
            id: ScheduleId::v4(),
            flow_id,
            owner,
            kind: ScheduleKind::Cron { expression, timezone },
            paused: false,
            fire_count: 0,
            next_fire_at: None,
        };
        schedule.next_fire_at = schedule.compute_next(Utc::now());
        Ok(schedule)
    }

    /// Build an interval schedule. Rejects anything faster than [`MIN_INTERVAL_MS`].
    pub fn interval(
        flow_id: FlowId,
        owner: Option<UserId>,
        interval_ms: i64,
    ) -> Result<Self, NebulaError> {
        if interval_ms < MIN_INTERVAL_MS {
            return Err(NebulaError::invalid_config(format!(
                "interval schedules require intervalMs >= {MIN_INTERVAL_MS}, got {interval_ms}"
            )));
        }
        let mut schedule = Self {
            id: ScheduleId::v4(),
            flow_id,
            owner,
            kind: ScheduleKind::Interval { interval_ms },
            paused: false,
            fire_count: 0,
            next_fire_at: None,
        };
        schedule.next_fire_at = schedule.compute_next(Utc::now());
        Ok(schedule)
    }

    /// `pause`: stop firing without forgetting `next_fire_at`.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// `resume`: recompute `next_fire_at` from the current time, so a long
    /// pause doesn't cause an immediate misfire-style catch-up on resume.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        self.paused = false;
        self.next_fire_at = self.compute_next(now);
    }

    /// If this schedule is due at `now`, advance it and return `true`.
    /// Never fires a paused schedule.
    pub fn poll_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.paused {
            return false;
        }
        let Some(due) = self.next_fire_at else {
            return false;
        };
        if due > now {
            return false;
        }
        self.fire_count += 1;
        self.next_fire_at = self.compute_next(now);
        true
    }

    /// `triggerNow`: fire immediately without disturbing `next_fire_at`.
    pub fn trigger_now(&mut self) {
        self.fire_count += 1;
    }

    fn compute_next(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.kind {
            ScheduleKind::Cron { expression, timezone } => {
                next_cron_fire(expression, timezone, from)
            }
            ScheduleKind::Interval { interval_ms } => {
                Some(from + ChronoDuration::milliseconds(*interval_ms))
            }
        }
    }
}

fn validate_cron_expression(expression: &str) -> Result<(), NebulaError> {
    cron::Schedule::from_str(expression)
        .map(|_| ())
        .map_err(|e| NebulaError::invalid_config(format!("invalid cron expression '{expression}': {e}")))
}

fn validate_timezone(timezone: &str) -> Result<(), NebulaError> {
    timezone
        .parse::<Tz>()
        .map(|_| ())
        .map_err(|()| NebulaError::invalid_config(format!("unknown timezone '{timezone}'")))
}

fn next_cron_fire(expression: &str, timezone: &str, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let schedule = cron::Schedule::from_str(expression).ok()?;
    let tz: Tz = timezone.parse().ok()?;
    let from_in_tz = from.with_timezone(&tz);
    schedule.after(&from_in_tz).next().map(|dt| dt.with_timezone(&Utc))
}
