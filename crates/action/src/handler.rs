//! The node-handler contract itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::NodeContext;
use crate::result::NodeResult;

/// Static metadata identifying a handler, shown in flow editors and the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// The key used in `NodeDef.node_type` and in [`crate::registry::HandlerRegistry`].
    pub key: String,
    /// Display name.
    pub name: String,
    /// One-line description of what the node does.
    pub description: String,
    /// Grouping used for catalog browsing (e.g. `"http"`, `"data"`, `"control-flow"`).
    pub category: String,
}

/// A single input or output port on a node's interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port key, referenced by edges' `source_handle`/by input resolution.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Whether omitting this input port is allowed.
    #[serde(default)]
    pub optional: bool,
}

/// A handler's declared inputs and outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    /// Input ports this node consumes.
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    /// Output ports this node may emit on.
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
}

/// Result of validating a node's configuration before it is allowed to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Field-level problems found in the config. Empty means valid.
    pub errors: Vec<nebula_error::FieldError>,
}

impl ValidationResult {
    /// The empty, valid result.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// A result carrying a single field error.
    #[must_use]
    pub fn with_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![nebula_error::FieldError {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    /// Returns `true` if no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The contract every node type implements to plug into the engine.
///
/// Object-safe so handlers are stored in the registry as `Arc<dyn NodeHandler>`.
/// `config_schema` returns a JSON Schema document; handlers that dispatch
/// across multiple resource/operation pairs (see `nebula-action`'s
/// `MultiOperationHandler`) annotate it with an `x-multi-operation` extension
/// the editor uses to render a resource/operation picker.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Static identity and catalog metadata.
    fn descriptor(&self) -> NodeDescriptor;

    /// JSON Schema describing the shape of `NodeDef.config` this handler accepts.
    fn config_schema(&self) -> Value;

    /// The handler's input/output port declarations.
    fn interface_definition(&self) -> InterfaceDefinition;

    /// Validate a resolved config before the coordinator will schedule this node.
    ///
    /// Called at publish time and again immediately before dispatch; handlers
    /// should not assume validation already ran.
    fn validate(&self, config: &Value) -> ValidationResult {
        let _ = config;
        ValidationResult::ok()
    }

    /// Execute the node.
    async fn execute(&self, ctx: NodeContext) -> NodeResult;
}
