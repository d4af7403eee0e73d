//! Static workflow definition types: nodes, edges, and the flow itself.

use std::collections::HashMap;

use nebula_core::{FlowId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single node in a flow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique within the owning [`FlowDefinition`].
    pub id: NodeId,
    /// Handler key looked up in the node-handler registry, e.g. `"http.request"`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display label; purely cosmetic.
    #[serde(default)]
    pub label: Option<String>,
    /// Handler-specific configuration, validated by the handler's own schema.
    #[serde(default)]
    pub config: Value,
    /// Marks a node as a trigger entrypoint (webhook/schedule/form/manual).
    ///
    /// A flow must contain at least one trigger node, and every trigger node
    /// must have zero incoming edges; see [`crate::validate::validate_flow`].
    #[serde(default)]
    pub is_trigger: bool,
    /// Error propagation policy on terminal `Failure`.
    ///
    /// `false` (the default, `STOP_ON_ERROR`) fails the whole execution.
    /// `true` (`CONTINUE_ON_ERROR`) marks only this node failed, treats its
    /// output as an empty object for downstream nodes, and makes its `error`
    /// handle (if declared) the sole live outgoing handle.
    #[serde(default)]
    pub continue_on_error: bool,
}

impl NodeDef {
    /// Construct a non-trigger node with empty config.
    #[must_use]
    pub fn new(id: NodeId, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            label: None,
            config: Value::Null,
            is_trigger: false,
            continue_on_error: false,
        }
    }

    /// Mark this node as a trigger entrypoint.
    #[must_use]
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Attach a config value.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Opt this node into `CONTINUE_ON_ERROR` propagation policy.
    #[must_use]
    pub fn with_continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }
}

/// A directed edge from one node's output handle to another node's input.
///
/// `source_handle` distinguishes which output port the edge is attached to
/// (e.g. a branch node's `"true"`/`"false"` handles, or `None` for the
/// single default handle). Only edges whose handle is among the set the
/// handler actually emitted are followed at dispatch time; see spec.md §4.3
/// ("ready-set computation with handle suppression").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Upstream node.
    pub source_id: NodeId,
    /// Upstream output handle, or `None` for the default/only handle.
    #[serde(default)]
    pub source_handle: Option<String>,
    /// Downstream node.
    pub target_id: NodeId,
}

impl Edge {
    /// Construct an edge on the default handle.
    #[must_use]
    pub fn new(source_id: NodeId, target_id: NodeId) -> Self {
        Self {
            source_id,
            source_handle: None,
            target_id,
        }
    }

    /// Construct an edge attached to a named output handle.
    #[must_use]
    pub fn on_handle(source_id: NodeId, handle: impl Into<String>, target_id: NodeId) -> Self {
        Self {
            source_id,
            source_handle: Some(handle.into()),
            target_id,
        }
    }
}

/// Free-form per-flow settings (e.g. `maxConcurrentExecutions`, default timeouts).
///
/// Kept as a typed wrapper rather than a bare map so new settings can be
/// promoted to first-class fields without breaking the `FlowDefinition` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    /// Upper bound on concurrently-running executions of this flow, if capped.
    #[serde(default)]
    pub max_concurrent_executions: Option<u32>,
    /// Any additional settings not yet promoted to a typed field.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A versioned workflow definition: the published DAG a trigger fires into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Identity of the owning flow (stable across versions).
    pub flow_id: FlowId,
    /// Monotonically increasing version number for this flow.
    pub version: u32,
    /// All nodes in the graph.
    pub nodes: Vec<NodeDef>,
    /// All edges in the graph.
    pub edges: Vec<Edge>,
    /// Flow-level settings.
    #[serde(default)]
    pub settings: FlowSettings,
}

impl FlowDefinition {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes marked as trigger entrypoints.
    pub fn trigger_nodes(&self) -> impl Iterator<Item = &NodeDef> {
        self.nodes.iter().filter(|n| n.is_trigger)
    }
}
