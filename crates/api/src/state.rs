//! `AppState`: the one struct every axum handler extracts from, wiring the
//! coordinator and every storage port into the request path. Constructed
//! once in `main` and shared from then on as an `Arc`-backed clone.

use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use nebula_action::HandlerRegistry;
use nebula_engine::Coordinator;
use nebula_error::{ErrorKind, NebulaError};
use nebula_store::{ApprovalRepo, ExecutionRepo, FlowRepo, FormRepo, HousekeepingJobRepo, ScheduleRepo, WebhookRepo};
use nebula_telemetry::TelemetryService;

use crate::config::EngineConfig;

/// A per-process, per-IP-unaware rate limiter shared across ingress routes.
///
/// Keyed globally rather than per-IP: `governor`'s `dashmap` keyed-limiter
/// flavor is reserved for when per-IP tracking is wired into the ingress
/// routes; the ambient surface here caps total ingress throughput.
pub type IngressLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared application state, cloned cheaply (every field is an `Arc`) into
/// every request handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub flows: Arc<dyn FlowRepo>,
    pub executions: Arc<dyn ExecutionRepo>,
    pub approvals: Arc<dyn ApprovalRepo>,
    pub webhooks: Arc<dyn WebhookRepo>,
    pub schedules: Arc<dyn ScheduleRepo>,
    pub forms: Arc<dyn FormRepo>,
    pub housekeeping_jobs: Arc<dyn HousekeepingJobRepo>,
    pub handlers: Arc<HandlerRegistry>,
    pub telemetry: Arc<dyn TelemetryService>,
    pub config: Arc<EngineConfig>,
    pub ingress_limiter: Arc<IngressLimiter>,
}

impl AppState {
    /// Assemble application state from its already-constructed collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        coordinator: Arc<Coordinator>,
        flows: Arc<dyn FlowRepo>,
        executions: Arc<dyn ExecutionRepo>,
        approvals: Arc<dyn ApprovalRepo>,
        webhooks: Arc<dyn WebhookRepo>,
        schedules: Arc<dyn ScheduleRepo>,
        forms: Arc<dyn FormRepo>,
        housekeeping_jobs: Arc<dyn HousekeepingJobRepo>,
        handlers: Arc<HandlerRegistry>,
        telemetry: Arc<dyn TelemetryService>,
        config: EngineConfig,
    ) -> Self {
        let quota = Quota::per_minute(
            std::num::NonZeroU32::new(config.rate_limit_per_minute.max(1))
                .unwrap_or(std::num::NonZeroU32::new(1).expect("1 is nonzero")),
        );
        Self {
            coordinator,
            flows,
            executions,
            approvals,
            webhooks,
            schedules,
            forms,
            housekeeping_jobs,
            handlers,
            telemetry,
            config: Arc::new(config),
            ingress_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Enforce the process-wide ingress budget (spec.md §5's backpressure
    /// rule). Called by the webhook and form-trigger routes before any work
    /// against the store or coordinator happens.
    pub fn check_ingress_rate_limit(&self) -> Result<(), NebulaError> {
        self.ingress_limiter
            .check()
            .map_err(|_| NebulaError::new(ErrorKind::RateLimited, "ingress rate limit exceeded"))
    }
}
