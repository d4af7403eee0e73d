//! Glue between [`nebula_telemetry::TelemetryService`] and the `Arc<EventBus>`
//! the coordinator needs by value, so both see the same stream of events
//! instead of two independently-buffered buses.

use std::sync::Arc;

use nebula_telemetry::event::EventBus;
use nebula_telemetry::metrics::MetricsRegistry;
use nebula_telemetry::TelemetryService;

/// A [`TelemetryService`] backed by an `Arc<EventBus>` the caller also hands
/// to [`nebula_engine::Coordinator::new`], so events emitted during
/// scheduling are visible through this service's `event_bus()` too.
pub struct SharedTelemetry {
    event_bus: Arc<EventBus>,
    metrics: MetricsRegistry,
}

impl SharedTelemetry {
    /// Build a telemetry service sharing `event_bus` with the coordinator.
    #[must_use]
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            metrics: MetricsRegistry::new(),
        }
    }

    /// The underlying bus, for wiring into [`nebula_engine::Coordinator::new`].
    #[must_use]
    pub fn event_bus_handle(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }
}

impl TelemetryService for SharedTelemetry {
    fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }
}
