//! Persistence ports for the three trigger-ingress entities: webhooks,
//! schedules, and forms.
//!
//! Method names are namespaced per entity (`get_webhook`, not `get`) rather
//! than overloading `get`/`create`/`update`/`delete` across ports, since
//! `nebula-store::InMemoryStore` implements all of them on one concrete
//! type and a bare `store.get(...)` would otherwise be ambiguous.

use async_trait::async_trait;
use nebula_core::{FlowId, FormTriggerId, ScheduleId, WebhookId};
use nebula_error::NebulaError;
use nebula_trigger::{FormSubmission, FormTrigger, Schedule, Webhook};

/// Persistence interface for registered webhooks.
#[async_trait]
pub trait WebhookRepo: Send + Sync {
    /// Register a webhook. Errors if `(path, method)` is already taken.
    async fn register_webhook(&self, webhook: Webhook) -> Result<(), NebulaError>;

    /// Find the active webhook routed to by `(path, method)`, if any.
    async fn find_webhook_by_route(&self, path: &str, method: &str) -> Result<Option<Webhook>, NebulaError>;

    async fn get_webhook(&self, id: WebhookId) -> Result<Option<Webhook>, NebulaError>;

    async fn update_webhook(&self, webhook: Webhook) -> Result<(), NebulaError>;

    async fn delete_webhook(&self, id: WebhookId) -> Result<bool, NebulaError>;
}

/// Persistence interface for recurring schedules.
#[async_trait]
pub trait ScheduleRepo: Send + Sync {
    async fn create_schedule(&self, schedule: Schedule) -> Result<(), NebulaError>;

    async fn get_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, NebulaError>;

    /// All schedules for a flow, for the ingress poller's fan-out.
    async fn list_schedules_for_flow(&self, flow_id: FlowId) -> Result<Vec<Schedule>, NebulaError>;

    /// Every schedule the poller should evaluate on this tick (unpaused ones).
    async fn list_active_schedules(&self) -> Result<Vec<Schedule>, NebulaError>;

    async fn update_schedule(&self, schedule: Schedule) -> Result<(), NebulaError>;

    async fn delete_schedule(&self, id: ScheduleId) -> Result<bool, NebulaError>;
}

/// Persistence interface for form triggers and the submissions against them.
#[async_trait]
pub trait FormRepo: Send + Sync {
    async fn create_form_trigger(&self, trigger: FormTrigger) -> Result<(), NebulaError>;

    /// Look a trigger up by its public `formToken`. `formToken` is globally
    /// unique, enforced here at creation time.
    async fn find_form_by_token(&self, form_token: &str) -> Result<Option<FormTrigger>, NebulaError>;

    async fn get_form_trigger(&self, id: FormTriggerId) -> Result<Option<FormTrigger>, NebulaError>;

    async fn update_form_trigger(&self, trigger: FormTrigger) -> Result<(), NebulaError>;

    async fn record_form_submission(&self, submission: FormSubmission) -> Result<(), NebulaError>;
}
