//! HTTP-level multi-user approval gate: two distinct users voting under
//! `mode = all` against a paused execution, driven through the real
//! `/api/approvals/{id}/actions` route rather than `ExecutionApproval`'s
//! vote-counting arithmetic in isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use nebula_action::{HandlerRegistry, InterfaceDefinition, NodeContext, NodeDescriptor, NodeHandler, NodeResult, ResumeCondition};
use nebula_api::{AppState, EngineConfig};
use nebula_approval::{ApprovalMode, ExecutionApproval};
use nebula_core::{FlowId, NodeId, UserId};
use nebula_engine::Coordinator;
use nebula_execution::{ExecutionStatus, TriggerType};
use nebula_store::{ApprovalRepo, ExecutionRepo, FlowRepo, InMemoryStore};
use nebula_telemetry::event::EventBus;
use nebula_workflow::{Edge, FlowDefinition, NodeDef};
use serde_json::{Value, json};
use tower::ServiceExt;

struct EchoHandler;

#[async_trait]
impl NodeHandler for EchoHandler {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            key: "test.echo".into(),
            name: "Echo".into(),
            description: "returns its input".into(),
            category: "test".into(),
        }
    }
    fn config_schema(&self) -> Value {
        Value::Null
    }
    fn interface_definition(&self) -> InterfaceDefinition {
        InterfaceDefinition::default()
    }
    fn validate(&self, _config: &Value) -> nebula_action::ValidationResult {
        nebula_action::ValidationResult::ok()
    }
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        NodeResult::success(ctx.config)
    }
}

struct ApprovalHandler;

#[async_trait]
impl NodeHandler for ApprovalHandler {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            key: "test.approval".into(),
            name: "Approval".into(),
            description: "pauses for a sign-off".into(),
            category: "test".into(),
        }
    }
    fn config_schema(&self) -> Value {
        Value::Null
    }
    fn interface_definition(&self) -> InterfaceDefinition {
        InterfaceDefinition::default()
    }
    fn validate(&self, _config: &Value) -> nebula_action::ValidationResult {
        nebula_action::ValidationResult::ok()
    }
    async fn execute(&self, _ctx: NodeContext) -> NodeResult {
        NodeResult::Pause {
            reason: "needs two sign-offs".into(),
            resume_condition: ResumeCondition::Approval {
                approval_id: "placeholder".into(),
            },
        }
    }
}

fn token_for(user_id: UserId, secret: &str) -> String {
    let claims = json!({"sub": user_id.to_string(), "exp": 9_999_999_999u64});
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[tokio::test]
async fn two_distinct_users_resolve_a_mode_all_approval_gate() {
    let secret = "s3cret";
    let store = Arc::new(InMemoryStore::new());
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(EchoHandler));
    registry.register(Arc::new(ApprovalHandler));
    let handlers = Arc::new(registry);
    let events = Arc::new(EventBus::new(256));
    let coordinator = Arc::new(Coordinator::new(store.clone(), store.clone(), handlers.clone(), events, 8));

    let flow_id = FlowId::v4();
    let trigger = NodeId::v4();
    let approval_node = NodeId::v4();
    let flow = FlowDefinition {
        flow_id,
        version: 1,
        nodes: vec![
            NodeDef::new(trigger, "test.echo").as_trigger(),
            NodeDef::new(approval_node, "test.approval"),
        ],
        edges: vec![Edge::new(trigger, approval_node)],
        settings: Default::default(),
    };
    store.publish(flow).await.unwrap();

    let execution = coordinator
        .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Paused);

    let gate = ExecutionApproval::new(execution.id, approval_node, ApprovalMode::All, 2, None);
    let approval_id = gate.id;
    store.create_gate(gate).await.unwrap();

    let mut config = EngineConfig::for_test();
    config.jwt_secret = Some(secret.to_string());

    let state = AppState::new(
        coordinator,
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        handlers,
        Arc::new(nebula_api::telemetry::SharedTelemetry::new(Arc::new(EventBus::new(256)))),
        config,
    );

    let user_a = UserId::v4();
    let user_b = UserId::v4();

    let app = nebula_api::routes::router(state.clone());
    let first = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/approvals/{approval_id}/actions"))
                .header("authorization", format!("Bearer {}", token_for(user_a, secret)))
                .header("content-type", "application/json")
                .body(Body::from(json!({"action": "approve"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Give the (synchronous, but HTTP-dispatched) first vote a beat before
    // asserting intermediate state through the store.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let after_first = store.get(execution.id).await.unwrap().unwrap();
    assert_eq!(after_first.status, ExecutionStatus::Paused);

    let app = nebula_api::routes::router(state);
    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/approvals/{approval_id}/actions"))
                .header("authorization", format!("Bearer {}", token_for(user_b, secret)))
                .header("content-type", "application/json")
                .body(Body::from(json!({"action": "approve"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let after_second = store.get(execution.id).await.unwrap().unwrap();
    assert_eq!(after_second.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn the_same_user_voting_twice_is_rejected() {
    let secret = "s3cret";
    let store = Arc::new(InMemoryStore::new());
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(EchoHandler));
    registry.register(Arc::new(ApprovalHandler));
    let handlers = Arc::new(registry);
    let events = Arc::new(EventBus::new(256));
    let coordinator = Arc::new(Coordinator::new(store.clone(), store.clone(), handlers.clone(), events, 8));

    let flow_id = FlowId::v4();
    let trigger = NodeId::v4();
    let approval_node = NodeId::v4();
    let flow = FlowDefinition {
        flow_id,
        version: 1,
        nodes: vec![
            NodeDef::new(trigger, "test.echo").as_trigger(),
            NodeDef::new(approval_node, "test.approval"),
        ],
        edges: vec![Edge::new(trigger, approval_node)],
        settings: Default::default(),
    };
    store.publish(flow).await.unwrap();

    let execution = coordinator
        .start_execution(flow_id, None, Value::Null, Value::Null, None, TriggerType::Manual)
        .await
        .unwrap();

    let gate = ExecutionApproval::new(execution.id, approval_node, ApprovalMode::All, 2, None);
    let approval_id = gate.id;
    store.create_gate(gate).await.unwrap();

    let mut config = EngineConfig::for_test();
    config.jwt_secret = Some(secret.to_string());
    let state = AppState::new(
        coordinator,
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        handlers,
        Arc::new(nebula_api::telemetry::SharedTelemetry::new(Arc::new(EventBus::new(256)))),
        config,
    );

    let user_a = UserId::v4();
    let request = || {
        Request::builder()
            .method("POST")
            .uri(format!("/api/approvals/{approval_id}/actions"))
            .header("authorization", format!("Bearer {}", token_for(user_a, secret)))
            .header("content-type", "application/json")
            .body(Body::from(json!({"action": "approve"}).to_string()))
            .unwrap()
    };

    let app = nebula_api::routes::router(state.clone());
    let first = app.oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let app = nebula_api::routes::router(state);
    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}
