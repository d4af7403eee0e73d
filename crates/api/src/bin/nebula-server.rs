//! `nebula-server`: process entrypoint. Wires storage, the handler
//! registry, the execution coordinator, and the HTTP surface together, then
//! serves until a shutdown signal arrives.
//!
//! Kept deliberately flat — one function, top to bottom construction: every
//! collaborator is built once here and handed down as an `Arc`, with no
//! implicit global initialization order to reason about.

use std::net::SocketAddr;
use std::sync::Arc;

use nebula_action::HandlerRegistry;
use nebula_api::config::EngineConfig;
use nebula_api::state::AppState;
use nebula_api::{routes, schedule_poll, sweep};
use nebula_engine::Coordinator;
use nebula_store::{ApprovalRepo, ExecutionRepo, FlowRepo, FormRepo, HousekeepingJobRepo, InMemoryStore, ScheduleRepo, WebhookRepo};
use nebula_telemetry::event::EventBus;
use tracing::info;

const EVENT_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env()?;
    info!(bind_addr = %config.bind_addr, "starting nebula-server");

    let store = Arc::new(InMemoryStore::new());
    let flows: Arc<dyn FlowRepo> = store.clone();
    let executions: Arc<dyn ExecutionRepo> = store.clone();
    let approvals: Arc<dyn ApprovalRepo> = store.clone();
    let webhooks: Arc<dyn WebhookRepo> = store.clone();
    let schedules: Arc<dyn ScheduleRepo> = store.clone();
    let forms: Arc<dyn FormRepo> = store.clone();
    let housekeeping_jobs: Arc<dyn HousekeepingJobRepo> = store.clone();

    // Populated by whatever node-handler integrations the deployment wires
    // in; per-integration handler implementations are out of this crate's
    // scope (spec.md §1).
    let handlers = Arc::new(HandlerRegistry::new());

    let event_bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
    let telemetry = Arc::new(nebula_api::telemetry::SharedTelemetry::new(event_bus.clone()));

    let coordinator = Arc::new(
        Coordinator::new(
            flows.clone(),
            executions.clone(),
            handlers.clone(),
            event_bus.clone(),
            config.max_concurrent_nodes,
        )
        .with_node_timeout(config.default_node_timeout),
    );

    let state = AppState::new(
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
        config.clone(),
    );

    let _housekeeping_task = sweep::spawn_housekeeping_sweep(
        state.clone(),
        config.housekeeping_interval,
        config.execution_retention_days,
        config.housekeeping_batch_size,
    );
    let _approval_sweep_task = sweep::spawn_approval_expiry_sweep(state.clone(), config.schedule_poll_interval);
    let _schedule_poll_task = schedule_poll::spawn_schedule_poller(state.clone(), config.schedule_poll_interval);

    let app = routes::router(state);
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(local_addr = %listener.local_addr()?, "nebula-server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("nebula-server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
