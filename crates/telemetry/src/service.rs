//! Telemetry service trait and implementations.

use std::sync::Arc;

use crate::event::EventBus;
use crate::metrics::MetricsRegistry;

/// Telemetry facade shared across the engine and API via `Arc<dyn TelemetryService>`.
pub trait TelemetryService: Send + Sync {
    /// Access the event bus for emitting and subscribing to events.
    fn event_bus(&self) -> &EventBus;

    /// Access the metrics registry for recording metrics.
    fn metrics(&self) -> &MetricsRegistry;
}

/// A telemetry implementation with no external exporter.
///
/// Events are broadcast in-process (dropped if no subscriber is listening);
/// metrics accumulate in memory. Suitable until an exporter is wired up in
/// `nebula-api`.
pub struct NoopTelemetry {
    event_bus: EventBus,
    metrics: MetricsRegistry,
}

impl NoopTelemetry {
    /// Create a new in-process-only telemetry service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_bus: EventBus::new(128),
            metrics: MetricsRegistry::new(),
        }
    }

    /// Create as an `Arc<dyn TelemetryService>` for dependency injection.
    #[must_use]
    pub fn arc() -> Arc<dyn TelemetryService> {
        Arc::new(Self::new())
    }
}

impl Default for NoopTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryService for NoopTelemetry {
    fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }
}
