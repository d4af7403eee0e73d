//! `EngineConfig`: typed process configuration, loaded from environment
//! variables with sane defaults: a single validated struct constructed
//! once at startup and shared read-only from then on.

use std::time::Duration;

use nebula_error::NebulaError;

/// Process-wide configuration for the `nebula-server` binary.
///
/// Constructed once via [`EngineConfig::from_env`] at startup and shared as
/// part of [`crate::state::AppState`]; nothing downstream re-reads the
/// environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Upper bound on concurrently-dispatched nodes across all executions.
    pub max_concurrent_nodes: usize,
    /// Default per-node dispatch timeout.
    pub default_node_timeout: Duration,
    /// How often the housekeeping sweep runs.
    pub housekeeping_interval: Duration,
    /// How often the schedule poller checks for due schedules.
    pub schedule_poll_interval: Duration,
    /// Terminal executions older than this are eligible for archival.
    pub execution_retention_days: i64,
    /// Batch size for one housekeeping archival pass.
    pub housekeeping_batch_size: usize,
    /// Maximum accepted webhook/form request body size, in bytes.
    pub max_payload_bytes: usize,
    /// Secret used to verify bearer JWTs on authenticated routes. `None`
    /// means every request is treated as anonymous (`userId = null`).
    pub jwt_secret: Option<String>,
    /// Per-IP request budget for the webhook and form ingress routes.
    pub rate_limit_per_minute: u32,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONCURRENT_NODES: usize = 64;
const DEFAULT_NODE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HOUSEKEEPING_INTERVAL_SECS: u64 = 3600;
const DEFAULT_SCHEDULE_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_EXECUTION_RETENTION_DAYS: i64 = 30;
const DEFAULT_HOUSEKEEPING_BATCH_SIZE: usize = 100;
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 600;

impl EngineConfig {
    /// Load configuration from the process environment, falling back to
    /// defaults for anything unset. Errors if a set variable fails to parse.
    pub fn from_env() -> Result<Self, NebulaError> {
        Ok(Self {
            bind_addr: env_or("NEBULA_BIND_ADDR", DEFAULT_BIND_ADDR),
            max_concurrent_nodes: env_parsed("NEBULA_MAX_CONCURRENT_NODES", DEFAULT_MAX_CONCURRENT_NODES)?,
            default_node_timeout: Duration::from_secs(env_parsed(
                "NEBULA_NODE_TIMEOUT_SECS",
                DEFAULT_NODE_TIMEOUT_SECS,
            )?),
            housekeeping_interval: Duration::from_secs(env_parsed(
                "NEBULA_HOUSEKEEPING_INTERVAL_SECS",
                DEFAULT_HOUSEKEEPING_INTERVAL_SECS,
            )?),
            schedule_poll_interval: Duration::from_secs(env_parsed(
                "NEBULA_SCHEDULE_POLL_INTERVAL_SECS",
                DEFAULT_SCHEDULE_POLL_INTERVAL_SECS,
            )?),
            execution_retention_days: env_parsed(
                "NEBULA_EXECUTION_RETENTION_DAYS",
                DEFAULT_EXECUTION_RETENTION_DAYS,
            )?,
            housekeeping_batch_size: env_parsed(
                "NEBULA_HOUSEKEEPING_BATCH_SIZE",
                DEFAULT_HOUSEKEEPING_BATCH_SIZE,
            )?,
            max_payload_bytes: env_parsed("NEBULA_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?,
            jwt_secret: std::env::var("NEBULA_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            rate_limit_per_minute: env_parsed(
                "NEBULA_RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
        })
    }

    /// A config with every default, no JWT secret, for tests. Bypasses
    /// environment parsing entirely. NEVER enabled outside `test-util`.
    #[cfg(feature = "test-util")]
    #[must_use]
    pub fn for_test() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_concurrent_nodes: DEFAULT_MAX_CONCURRENT_NODES,
            default_node_timeout: Duration::from_secs(DEFAULT_NODE_TIMEOUT_SECS),
            housekeeping_interval: Duration::from_secs(DEFAULT_HOUSEKEEPING_INTERVAL_SECS),
            schedule_poll_interval: Duration::from_secs(DEFAULT_SCHEDULE_POLL_INTERVAL_SECS),
            execution_retention_days: DEFAULT_EXECUTION_RETENTION_DAYS,
            housekeeping_batch_size: DEFAULT_HOUSEKEEPING_BATCH_SIZE,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            jwt_secret: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, NebulaError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| NebulaError::invalid_config(format!("{key}='{raw}' is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(all(test, feature = "test-util"))]
mod tests {
    use super::*;

    #[test]
    fn for_test_has_no_jwt_secret() {
        assert!(EngineConfig::for_test().jwt_secret.is_none());
    }

    #[test]
    fn for_test_matches_documented_defaults() {
        let config = EngineConfig::for_test();
        assert_eq!(config.max_concurrent_nodes, DEFAULT_MAX_CONCURRENT_NODES);
        assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }
}
