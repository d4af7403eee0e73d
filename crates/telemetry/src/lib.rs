#![warn(missing_docs)]

//! # Nebula Telemetry
//!
//! Event bus, metrics, and observability for the Nebula workflow engine.
//!
//! - [`EventBus`] — broadcast-based event distribution
//! - [`ExecutionEvent`] — execution lifecycle events, including pause/approval/form gates
//! - [`TelemetryService`] trait — pluggable telemetry backend
//! - [`NoopTelemetry`] — in-process-only implementation
//!
//! Events here are projections, not the source of truth — `nebula-store`'s
//! durable state is authoritative.

pub mod event;
pub mod metrics;
pub mod service;

pub use event::{EventBus, EventSubscriber, ExecutionEvent};
pub use metrics::{Counter, Gauge, Histogram, MetricsRegistry};
pub use service::{NoopTelemetry, TelemetryService};
