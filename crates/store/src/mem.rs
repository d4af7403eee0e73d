//! An in-memory reference implementation of the storage ports.
//!
//! Backed by [`dashmap`] for lock-free concurrent access. Not durable across
//! process restarts — useful for tests and for running the engine without a
//! real database configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nebula_approval::{ApprovalAction, ExecutionApproval};
use nebula_core::{
    ApprovalId, ExecutionId, FlowId, FormTriggerId, HousekeepingJobId, NodeId, ScheduleId, UserId,
    WebhookId,
};
use nebula_error::NebulaError;
use nebula_execution::Execution;
use nebula_housekeeping::{HousekeepingJob, JobKind, JobStatus};
use nebula_trigger::{FormSubmission, FormTrigger, Schedule, Webhook};
use nebula_workflow::FlowDefinition;

use crate::approval_repo::ApprovalRepo;
use crate::execution_repo::ExecutionRepo;
use crate::flow_repo::FlowRepo;
use crate::housekeeping_repo::HousekeepingJobRepo;
use crate::trigger_repo::{FormRepo, ScheduleRepo, WebhookRepo};

/// An in-memory implementation of every storage port this workspace defines.
#[derive(Default)]
pub struct InMemoryStore {
    flows: DashMap<(FlowId, u32), FlowDefinition>,
    latest_flow_version: DashMap<FlowId, AtomicU32>,
    executions: DashMap<ExecutionId, Execution>,
    approvals: DashMap<ApprovalId, ExecutionApproval>,
    approval_actions: DashMap<(ApprovalId, UserId), ApprovalAction>,
    webhooks: DashMap<WebhookId, Webhook>,
    schedules: DashMap<ScheduleId, Schedule>,
    form_triggers: DashMap<FormTriggerId, FormTrigger>,
    form_tokens: DashMap<String, FormTriggerId>,
    form_submissions: DashMap<nebula_core::FormSubmissionId, FormSubmission>,
    housekeeping_jobs: DashMap<HousekeepingJobId, HousekeepingJob>,
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowRepo for InMemoryStore {
    async fn get(&self, id: FlowId, version: u32) -> Result<Option<FlowDefinition>, NebulaError> {
        Ok(self.flows.get(&(id, version)).map(|e| e.value().clone()))
    }

    async fn get_latest(&self, id: FlowId) -> Result<Option<FlowDefinition>, NebulaError> {
        let Some(version) = self.latest_flow_version.get(&id) else {
            return Ok(None);
        };
        let version = version.load(Ordering::Acquire);
        FlowRepo::get(self, id, version).await
    }

    async fn publish(&self, definition: FlowDefinition) -> Result<(), NebulaError> {
        let key = (definition.flow_id, definition.version);
        self.latest_flow_version
            .entry(definition.flow_id)
            .and_modify(|v| {
                v.fetch_max(definition.version, Ordering::AcqRel);
            })
            .or_insert_with(|| AtomicU32::new(definition.version));
        self.flows.insert(key, definition);
        Ok(())
    }

    async fn delete(&self, id: FlowId) -> Result<bool, NebulaError> {
        let existed = self.latest_flow_version.remove(&id).is_some();
        self.flows.retain(|(flow_id, _), _| *flow_id != id);
        Ok(existed)
    }
}

#[async_trait]
impl ExecutionRepo for InMemoryStore {
    async fn create(&self, execution: Execution) -> Result<(), NebulaError> {
        if self.executions.contains_key(&execution.id) {
            return Err(NebulaError::invalid_config(format!(
                "execution '{}' already exists",
                execution.id
            )));
        }
        self.executions.insert(execution.id, execution);
        Ok(())
    }

    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>, NebulaError> {
        Ok(self.executions.get(&id).map(|e| e.value().clone()))
    }

    async fn cas_update(
        &self,
        id: ExecutionId,
        expected_version: u64,
        new_state: Execution,
    ) -> Result<bool, NebulaError> {
        let Some(mut entry) = self.executions.get_mut(&id) else {
            return Err(NebulaError::execution_not_found(id));
        };
        if entry.version != expected_version {
            return Ok(false);
        }
        *entry = new_state;
        Ok(true)
    }

    async fn list_for_archival(
        &self,
        cutoff: DateTime<Utc>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Execution>, NebulaError> {
        let mut matches: Vec<Execution> = self
            .executions
            .iter()
            .filter(|e| e.status.is_terminal())
            .filter(|e| e.completed_at.is_some_and(|at| at < cutoff))
            .map(|e| e.value().clone())
            .collect();
        matches.sort_by_key(|e| e.id.to_string());
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete(&self, id: ExecutionId) -> Result<bool, NebulaError> {
        Ok(self.executions.remove(&id).is_some())
    }
}

#[async_trait]
impl ApprovalRepo for InMemoryStore {
    async fn create_gate(&self, approval: ExecutionApproval) -> Result<(), NebulaError> {
        self.approvals.insert(approval.id, approval);
        Ok(())
    }

    async fn get_gate(&self, id: ApprovalId) -> Result<Option<ExecutionApproval>, NebulaError> {
        Ok(self.approvals.get(&id).map(|e| e.value().clone()))
    }

    async fn get_pending_gate_for_node(
        &self,
        execution_id: ExecutionId,
        node_id: NodeId,
    ) -> Result<Option<ExecutionApproval>, NebulaError> {
        Ok(self
            .approvals
            .iter()
            .find(|e| {
                e.execution_id == execution_id
                    && e.node_id == node_id
                    && e.status == nebula_approval::ApprovalStatus::Pending
            })
            .map(|e| e.value().clone()))
    }

    async fn record_action(
        &self,
        action: ApprovalAction,
        updated: ExecutionApproval,
    ) -> Result<(), NebulaError> {
        let key = (action.approval_id, action.user_id);
        if self.approval_actions.contains_key(&key) {
            return Err(NebulaError::already_acted());
        }
        self.approval_actions.insert(key, action);
        self.approvals.insert(updated.id, updated);
        Ok(())
    }

    async fn list_pending_gates_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExecutionApproval>, NebulaError> {
        Ok(self
            .approvals
            .iter()
            .filter(|e| {
                e.status == nebula_approval::ApprovalStatus::Pending
                    && e.expires_at.is_some_and(|at| at <= cutoff)
            })
            .map(|e| e.value().clone())
            .collect())
    }

    async fn update_gate(&self, approval: ExecutionApproval) -> Result<(), NebulaError> {
        self.approvals.insert(approval.id, approval);
        Ok(())
    }

    async fn actions_for(&self, approval_id: ApprovalId) -> Result<Vec<ApprovalAction>, NebulaError> {
        Ok(self
            .approval_actions
            .iter()
            .filter(|e| e.key().0 == approval_id)
            .map(|e| e.value().clone())
            .collect())
    }
}

#[async_trait]
impl WebhookRepo for InMemoryStore {
    async fn register_webhook(&self, webhook: Webhook) -> Result<(), NebulaError> {
        if self
            .webhooks
            .iter()
            .any(|w| w.path == webhook.path && w.method == webhook.method)
        {
            return Err(NebulaError::invalid_config(format!(
                "webhook route '{} {}' is already registered",
                webhook.method, webhook.path
            )));
        }
        self.webhooks.insert(webhook.id, webhook);
        Ok(())
    }

    async fn find_webhook_by_route(&self, path: &str, method: &str) -> Result<Option<Webhook>, NebulaError> {
        Ok(self
            .webhooks
            .iter()
            .find(|w| w.matches(path, method))
            .map(|w| w.value().clone()))
    }

    async fn get_webhook(&self, id: WebhookId) -> Result<Option<Webhook>, NebulaError> {
        Ok(self.webhooks.get(&id).map(|e| e.value().clone()))
    }

    async fn update_webhook(&self, webhook: Webhook) -> Result<(), NebulaError> {
        self.webhooks.insert(webhook.id, webhook);
        Ok(())
    }

    async fn delete_webhook(&self, id: WebhookId) -> Result<bool, NebulaError> {
        Ok(self.webhooks.remove(&id).is_some())
    }
}

#[async_trait]
impl ScheduleRepo for InMemoryStore {
    async fn create_schedule(&self, schedule: Schedule) -> Result<(), NebulaError> {
        self.schedules.insert(schedule.id, schedule);
        Ok(())
    }

    async fn get_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, NebulaError> {
        Ok(self.schedules.get(&id).map(|e| e.value().clone()))
    }

    async fn list_schedules_for_flow(&self, flow_id: FlowId) -> Result<Vec<Schedule>, NebulaError> {
        Ok(self
            .schedules
            .iter()
            .filter(|s| s.flow_id == flow_id)
            .map(|s| s.value().clone())
            .collect())
    }

    async fn list_active_schedules(&self) -> Result<Vec<Schedule>, NebulaError> {
        Ok(self
            .schedules
            .iter()
            .filter(|s| !s.paused)
            .map(|s| s.value().clone())
            .collect())
    }

    async fn update_schedule(&self, schedule: Schedule) -> Result<(), NebulaError> {
        self.schedules.insert(schedule.id, schedule);
        Ok(())
    }

    async fn delete_schedule(&self, id: ScheduleId) -> Result<bool, NebulaError> {
        Ok(self.schedules.remove(&id).is_some())
    }
}

#[async_trait]
impl FormRepo for InMemoryStore {
    async fn create_form_trigger(&self, trigger: FormTrigger) -> Result<(), NebulaError> {
        if self.form_tokens.contains_key(&trigger.form_token) {
            return Err(NebulaError::invalid_config(format!(
                "form token '{}' is already registered",
                trigger.form_token
            )));
        }
        self.form_tokens.insert(trigger.form_token.clone(), trigger.id);
        self.form_triggers.insert(trigger.id, trigger);
        Ok(())
    }

    async fn find_form_by_token(&self, form_token: &str) -> Result<Option<FormTrigger>, NebulaError> {
        let Some(id) = self.form_tokens.get(form_token).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.form_triggers.get(&id).map(|e| e.value().clone()))
    }

    async fn get_form_trigger(&self, id: FormTriggerId) -> Result<Option<FormTrigger>, NebulaError> {
        Ok(self.form_triggers.get(&id).map(|e| e.value().clone()))
    }

    async fn update_form_trigger(&self, trigger: FormTrigger) -> Result<(), NebulaError> {
        self.form_triggers.insert(trigger.id, trigger);
        Ok(())
    }

    async fn record_form_submission(&self, submission: FormSubmission) -> Result<(), NebulaError> {
        self.form_submissions.insert(submission.id, submission);
        Ok(())
    }
}

#[async_trait]
impl HousekeepingJobRepo for InMemoryStore {
    async fn create_job(&self, job: HousekeepingJob) -> Result<(), NebulaError> {
        self.housekeeping_jobs.insert(job.id, job);
        Ok(())
    }

    async fn update_job(&self, job: HousekeepingJob) -> Result<(), NebulaError> {
        self.housekeeping_jobs.insert(job.id, job);
        Ok(())
    }

    async fn get_job(&self, id: HousekeepingJobId) -> Result<Option<HousekeepingJob>, NebulaError> {
        Ok(self.housekeeping_jobs.get(&id).map(|e| e.value().clone()))
    }

    async fn list_running_jobs(&self, kind: JobKind) -> Result<Vec<HousekeepingJob>, NebulaError> {
        Ok(self
            .housekeeping_jobs
            .iter()
            .filter(|j| j.kind == kind && j.status == JobStatus::Running)
            .map(|j| j.value().clone())
            .collect())
    }
}
