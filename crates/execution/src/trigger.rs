//! The kind of entrypoint that started an execution.

use serde::{Deserialize, Serialize};

/// Which ingress started an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Started directly via the API, with no external event.
    Manual,
    /// Started by an inbound webhook request.
    Webhook,
    /// Started by a cron or interval schedule firing.
    Schedule,
    /// Started by a standalone form submission.
    Form,
    /// Started by `retryExecution` re-running a failed or cancelled execution.
    Retry,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::Form => "form",
            Self::Retry => "retry",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_rename_snake_case() {
        assert_eq!(
            serde_json::to_string(&TriggerType::Schedule).unwrap(),
            "\"schedule\""
        );
    }

    #[test]
    fn display_matches_serde_name() {
        assert_eq!(TriggerType::Webhook.to_string(), "webhook");
    }
}
