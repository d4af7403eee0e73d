//! A handler base for node types that fan out over a `(resource, operation)` pair.
//!
//! Many integrations expose dozens of API calls behind a single node type
//! (e.g. `"http.request"` vs. a hypothetical `"sheets"` node with
//! `resource: "row"`, `operation: "append"`). Rather than registering one
//! [`NodeHandler`] per call, `MultiOperationHandler` holds a table of
//! `(resource, operation) -> OperationFn` and dispatches into it, advertising
//! the available pairs to the editor via an `x-multi-operation` schema
//! extension.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::NodeContext;
use crate::handler::{InterfaceDefinition, NodeDescriptor, NodeHandler, ValidationResult};
use crate::result::NodeResult;

/// A single `(resource, operation)` implementation.
pub type OperationFn =
    Box<dyn Fn(NodeContext) -> Pin<Box<dyn Future<Output = NodeResult> + Send>> + Send + Sync>;

/// Key identifying one operation within a multi-operation handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    /// The resource the operation acts on, e.g. `"row"`.
    pub resource: String,
    /// The action taken on that resource, e.g. `"append"`.
    pub operation: String,
}

impl OperationKey {
    /// Build a key from its parts.
    pub fn new(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    fn from_config(config: &Value) -> Option<Self> {
        let resource = config.get("resource")?.as_str()?.to_string();
        let operation = config.get("operation")?.as_str()?.to_string();
        Some(Self { resource, operation })
    }
}

/// A [`NodeHandler`] that dispatches by `(resource, operation)` read out of its config.
pub struct MultiOperationHandler {
    descriptor: NodeDescriptor,
    operations: HashMap<OperationKey, OperationFn>,
}

impl MultiOperationHandler {
    /// Start building a multi-operation handler with no operations registered.
    #[must_use]
    pub fn new(descriptor: NodeDescriptor) -> Self {
        Self {
            descriptor,
            operations: HashMap::new(),
        }
    }

    /// Register one `(resource, operation)` implementation.
    #[must_use]
    pub fn with_operation(mut self, key: OperationKey, f: OperationFn) -> Self {
        self.operations.insert(key, f);
        self
    }

    /// The set of `(resource, operation)` pairs this handler supports, for the
    /// `x-multi-operation` schema extension.
    #[must_use]
    pub fn supported_operations(&self) -> Vec<OperationKey> {
        self.operations.keys().cloned().collect()
    }
}

#[async_trait]
impl NodeHandler for MultiOperationHandler {
    fn descriptor(&self) -> NodeDescriptor {
        self.descriptor.clone()
    }

    fn config_schema(&self) -> Value {
        let resources: Vec<&str> = self
            .operations
            .keys()
            .map(|k| k.resource.as_str())
            .collect();
        let operations: Vec<&str> = self
            .operations
            .keys()
            .map(|k| k.operation.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "required": ["resource", "operation"],
            "properties": {
                "resource": {"type": "string", "enum": resources},
                "operation": {"type": "string", "enum": operations},
            },
            "x-multi-operation": true,
        })
    }

    fn interface_definition(&self) -> InterfaceDefinition {
        InterfaceDefinition::default()
    }

    fn validate(&self, config: &Value) -> ValidationResult {
        match OperationKey::from_config(config) {
            Some(key) if self.operations.contains_key(&key) => ValidationResult::ok(),
            Some(key) => ValidationResult::with_error(
                "operation",
                format!(
                    "no such operation '{}' on resource '{}'",
                    key.operation, key.resource
                ),
            ),
            None => ValidationResult::with_error(
                "resource",
                "config must specify both 'resource' and 'operation'",
            ),
        }
    }

    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let Some(key) = OperationKey::from_config(&ctx.config) else {
            return NodeResult::failure(
                nebula_error::ErrorKind::InvalidConfig,
                "config must specify both 'resource' and 'operation'",
            );
        };
        match self.operations.get(&key) {
            Some(f) => f(ctx).await,
            None => NodeResult::failure(
                nebula_error::ErrorKind::InvalidConfig,
                format!(
                    "no such operation '{}' on resource '{}'",
                    key.operation, key.resource
                ),
            ),
        }
    }
}
