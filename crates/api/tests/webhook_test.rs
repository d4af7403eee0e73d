//! HTTP-level webhook ingress: routing, HMAC authentication, and the
//! resulting execution start, driven through the real axum router rather
//! than `nebula_trigger::Webhook::authenticate` in isolation.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use nebula_action::{HandlerRegistry, InterfaceDefinition, NodeContext, NodeDescriptor, NodeHandler, NodeResult, ValidationResult};
use nebula_api::{AppState, EngineConfig};
use nebula_core::{FlowId, NodeId};
use nebula_engine::Coordinator;
use nebula_store::{FlowRepo, InMemoryStore, WebhookRepo};
use nebula_telemetry::event::EventBus;
use nebula_trigger::{Webhook, WebhookAuth};
use nebula_workflow::{FlowDefinition, NodeDef};
use serde_json::json;
use sha2::Sha256;
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
    fn config_schema(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
    fn interface_definition(&self) -> InterfaceDefinition {
        InterfaceDefinition::default()
    }
    fn validate(&self, _config: &serde_json::Value) -> ValidationResult {
        ValidationResult::ok()
    }
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        NodeResult::success(ctx.config)
    }
}

async fn build_state() -> (AppState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(EchoHandler));
    let handlers = Arc::new(registry);
    let events = Arc::new(EventBus::new(256));
    let coordinator = Arc::new(Coordinator::new(store.clone(), store.clone(), handlers.clone(), events, 8));

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
        EngineConfig::for_test(),
    );
    (state, store)
}

async fn publish_trigger_only_flow(store: &InMemoryStore) -> FlowId {
    let flow_id = FlowId::v4();
    let trigger = NodeId::v4();
    let flow = FlowDefinition {
        flow_id,
        version: 1,
        nodes: vec![NodeDef::new(trigger, "test.echo").as_trigger()],
        edges: vec![],
        settings: Default::default(),
    };
    store.publish(flow).await.unwrap();
    flow_id
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn webhook_with_valid_hmac_signature_starts_an_execution() {
    let (state, store) = build_state().await;
    let flow_id = publish_trigger_only_flow(&store).await;
    let webhook = Webhook::new(flow_id, "orders-in", "POST", WebhookAuth::Hmac { secret: "s3cret".into() }).unwrap();
    store.register_webhook(webhook).await.unwrap();

    let app = nebula_api::routes::router(state);
    let body = br#"{"order_id": 42}"#.to_vec();
    let signature = sign("s3cret", &body);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/orders-in")
                .header("x-webhook-signature", signature)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let (state, store) = build_state().await;
    let flow_id = publish_trigger_only_flow(&store).await;
    let webhook = Webhook::new(flow_id, "orders-in", "POST", WebhookAuth::Hmac { secret: "s3cret".into() }).unwrap();
    store.register_webhook(webhook).await.unwrap();

    let app = nebula_api::routes::router(state);
    let body = br#"{"order_id": 42}"#.to_vec();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/orders-in")
                .header("x-webhook-signature", "0".repeat(64))
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_on_unregistered_path_returns_not_found() {
    let (state, _store) = build_state().await;
    let app = nebula_api::routes::router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/nothing-here")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
