//! `/api/approvals/{id}/actions` — casting an approve/reject vote against a
//! pending gate (spec.md §4.6).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use nebula_approval::{ActionKind, ApprovalAction, Decision, Resolution};
use nebula_core::ApprovalId;
use nebula_error::NebulaError;
use nebula_store::ApprovalRepo;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CastActionRequest {
    pub action: ActionKind,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct CastActionResponse {
    pub status: nebula_approval::ApprovalStatus,
    pub approved_count: u32,
    pub rejected_count: u32,
}

pub async fn cast_action(
    State(state): State<AppState>,
    Path(id): Path<ApprovalId>,
    headers: HeaderMap,
    Json(body): Json<CastActionRequest>,
) -> Result<Json<CastActionResponse>, ApiError> {
    let user_id = auth::authenticate(&headers, &state.config)?
        .ok_or_else(|| NebulaError::new(nebula_error::ErrorKind::Unauthorized, "approval actions require an authenticated user"))?;

    let mut gate = state
        .approvals
        .get_gate(id)
        .await?
        .ok_or_else(|| NebulaError::new(nebula_error::ErrorKind::ExecutionNotFound, format!("approval '{id}' not found")))?;

    if gate.status.is_terminal() {
        return Err(NebulaError::already_resolved().into());
    }

    let already_acted = state
        .approvals
        .actions_for(id)
        .await?
        .iter()
        .any(|a| a.user_id == user_id);
    if already_acted {
        return Err(NebulaError::already_acted().into());
    }

    let now = Utc::now();
    let action = ApprovalAction::new(id, user_id, body.action, body.comment);
    let resolution = gate.record_vote(body.action.is_approve(), now);

    state.approvals.record_action(action, gate.clone()).await?;

    if let Resolution::Resolved(decision) = resolution {
        let resume_data = serde_json::json!({
            "decision": decision_str(decision),
            "approvedCount": gate.approved_count,
            "rejectedCount": gate.rejected_count,
        });
        state
            .coordinator
            .resume_execution(gate.execution_id, resume_data, Some(user_id))
            .await?;
    }

    Ok(Json(CastActionResponse {
        status: gate.status,
        approved_count: gate.approved_count,
        rejected_count: gate.rejected_count,
    }))
}

fn decision_str(decision: Decision) -> &'static str {
    match decision {
        Decision::Approved => "approved",
        Decision::Rejected => "rejected",
        Decision::Expired => "expired",
    }
}
