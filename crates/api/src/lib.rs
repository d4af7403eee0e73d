//! HTTP surface and process wiring for the Nebula workflow engine.
//!
//! This crate has no domain logic of its own: it authenticates requests,
//! maps [`nebula_error::NebulaError`] onto the wire shape spec.md §7
//! describes, and translates HTTP/webhook/form/schedule events into calls
//! against [`nebula_engine::Coordinator`]. Everything that decides *what*
//! happens lives in the crates it depends on.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod schedule_poll;
pub mod state;
pub mod sweep;
pub mod telemetry;

pub use config::EngineConfig;
pub use error::ApiError;
pub use state::AppState;
