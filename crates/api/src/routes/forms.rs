//! `/forms/{token}` — form trigger definitions, trigger-form submissions,
//! and in-flow form submissions against a paused execution (spec.md §4.5).

use axum::Json;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use nebula_action::ResumeCondition;
use nebula_core::ExecutionId;
use nebula_error::{ErrorKind, NebulaError};
use nebula_execution::{ExecutionStatus, TriggerType};
use nebula_store::{ExecutionRepo, FormRepo};
use nebula_trigger::{FormSubmission, FormTrigger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FormDefinitionResponse {
    pub token: String,
    pub title: String,
    pub description: String,
    pub fields: Value,
    pub submit_button_text: String,
    pub success_message: String,
}

impl FormDefinitionResponse {
    fn from_trigger(trigger: &FormTrigger) -> Self {
        let config = &trigger.config;
        Self {
            token: trigger.form_token.clone(),
            title: config.get("title").and_then(Value::as_str).unwrap_or("Untitled form").to_string(),
            description: config.get("description").and_then(Value::as_str).unwrap_or_default().to_string(),
            fields: config.get("fields").cloned().unwrap_or_else(|| Value::Array(Vec::new())),
            submit_button_text: config
                .get("submitButtonText")
                .and_then(Value::as_str)
                .unwrap_or("Submit")
                .to_string(),
            success_message: config
                .get("successMessage")
                .and_then(Value::as_str)
                .unwrap_or("Thanks for your submission.")
                .to_string(),
        }
    }
}

pub async fn get_definition(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<FormDefinitionResponse>, ApiError> {
    let trigger = state
        .forms
        .find_form_by_token(&token)
        .await?
        .ok_or_else(|| NebulaError::new(ErrorKind::FlowNotFound, format!("no form registered for token '{token}'")))?;
    Ok(Json(FormDefinitionResponse::from_trigger(&trigger)))
}

#[derive(Serialize)]
pub struct SubmitTriggerResponse {
    pub success: bool,
    pub execution_id: ExecutionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

pub async fn submit_trigger(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<Value>,
) -> Result<Json<SubmitTriggerResponse>, ApiError> {
    state.check_ingress_rate_limit()?;
    let mut trigger = state
        .forms
        .find_form_by_token(&token)
        .await?
        .ok_or_else(|| NebulaError::new(ErrorKind::FlowNotFound, format!("no form registered for token '{token}'")))?;

    trigger.record_submission(Utc::now())?;

    let submission = FormSubmission::new_trigger_submission(trigger.id, payload.clone(), Some(addr.ip().to_string()));

    state.forms.update_form_trigger(trigger.clone()).await?;
    state.forms.record_form_submission(submission).await?;

    let execution = state
        .coordinator
        .start_execution(trigger.flow_id, None, payload, Value::Null, None, TriggerType::Form)
        .await?;

    Ok(Json(SubmitTriggerResponse {
        success: true,
        execution_id: execution.id,
        redirect_url: None,
    }))
}

#[derive(Serialize)]
pub struct SubmitInFlowResponse {
    pub success: bool,
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
}

pub async fn submit_in_flow(
    State(state): State<AppState>,
    Path(execution_id): Path<ExecutionId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<SubmitInFlowResponse>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?;

    let execution = state
        .executions
        .get(execution_id)
        .await?
        .ok_or_else(|| NebulaError::execution_not_found(execution_id))?;

    if execution.status != ExecutionStatus::Paused {
        return Err(NebulaError::not_paused(execution_id).into());
    }
    let waiting_node_id = execution
        .waiting_node_id
        .ok_or_else(|| NebulaError::wait_mismatch("<none>"))?;
    let condition: ResumeCondition = execution
        .resume_condition
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or_else(|| NebulaError::wait_mismatch("form"))?;
    let ResumeCondition::Form { form_token } = condition else {
        return Err(NebulaError::wait_mismatch("form").into());
    };

    let mut trigger = state
        .forms
        .find_form_by_token(&form_token)
        .await?
        .ok_or_else(|| NebulaError::new(ErrorKind::FlowNotFound, format!("no form registered for token '{form_token}'")))?;

    if !trigger.can_accept_submission(Utc::now()) {
        return Err(NebulaError::already_resolved().into());
    }
    trigger.record_submission(Utc::now())?;

    let submission = FormSubmission::new_in_flow_submission(
        trigger.id,
        execution_id,
        waiting_node_id,
        payload.clone(),
        user_id,
        Some(addr.ip().to_string()),
    );

    state.forms.update_form_trigger(trigger).await?;
    state.forms.record_form_submission(submission.clone()).await?;

    let resume_data = serde_json::json!({"formData": payload, "submissionId": submission.id});
    let resumed = state.coordinator.resume_execution(execution_id, resume_data, user_id).await?;

    Ok(Json(SubmitInFlowResponse {
        success: true,
        execution_id: resumed.id,
        status: resumed.status,
    }))
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct InFlowSubmitRequestShape {
    data: Value,
}
