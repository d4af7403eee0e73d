//! Structural validation of a [`FlowDefinition`] prior to publication.
//!
//! Rules (spec.md §3/§9):
//! - node ids are unique within the flow
//! - every edge references nodes that exist
//! - at least one trigger node exists, and every trigger node has in-degree zero
//! - the graph contains no cycles

use std::collections::HashSet;

use nebula_error::NebulaError;

use crate::graph::DependencyGraph;
use crate::types::FlowDefinition;

/// Validate a flow definition's structure. Returns `Ok(())` if the flow is
/// publishable, or the first structural violation found.
pub fn validate_flow(flow: &FlowDefinition) -> Result<(), NebulaError> {
    let mut seen = HashSet::with_capacity(flow.nodes.len());
    for node in &flow.nodes {
        if !seen.insert(node.id) {
            return Err(NebulaError::invalid_definition(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }
    }

    for edge in &flow.edges {
        if !seen.contains(&edge.source_id) {
            return Err(NebulaError::invalid_definition(format!(
                "edge references unknown source node '{}'",
                edge.source_id
            )));
        }
        if !seen.contains(&edge.target_id) {
            return Err(NebulaError::invalid_definition(format!(
                "edge references unknown target node '{}'",
                edge.target_id
            )));
        }
    }

    if flow.trigger_nodes().next().is_none() {
        return Err(NebulaError::invalid_definition(
            "flow has no trigger node",
        ));
    }

    let graph = DependencyGraph::build(&flow.nodes, &flow.edges);
    for trigger in flow.trigger_nodes() {
        if !graph.predecessors(trigger.id).is_empty() {
            return Err(NebulaError::invalid_definition(format!(
                "trigger node '{}' has incoming edges",
                trigger.id
            )));
        }
    }

    if graph.has_cycle() {
        return Err(NebulaError::invalid_definition(
            "flow graph contains a cycle",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, NodeDef};
    use nebula_core::{FlowId, NodeId};

    fn node(n: u8) -> NodeId {
        NodeId::parse(&format!("00000000-0000-0000-0000-{n:012}")).unwrap()
    }

    fn flow(nodes: Vec<NodeDef>, edges: Vec<Edge>) -> FlowDefinition {
        FlowDefinition {
            flow_id: FlowId::v4(),
            version: 1,
            nodes,
            edges,
            settings: Default::default(),
        }
    }

    #[test]
    fn valid_linear_flow_passes() {
        let f = flow(
            vec![
                NodeDef::new(node(1), "trigger.manual").as_trigger(),
                NodeDef::new(node(2), "noop"),
            ],
            vec![Edge::new(node(1), node(2))],
        );
        assert!(validate_flow(&f).is_ok());
    }

    #[test]
    fn duplicate_node_ids_rejected() {
        let f = flow(
            vec![
                NodeDef::new(node(1), "trigger.manual").as_trigger(),
                NodeDef::new(node(1), "noop"),
            ],
            vec![],
        );
        assert!(validate_flow(&f).is_err());
    }

    #[test]
    fn dangling_edge_rejected() {
        let f = flow(
            vec![NodeDef::new(node(1), "trigger.manual").as_trigger()],
            vec![Edge::new(node(1), node(2))],
        );
        let err = validate_flow(&f).unwrap_err();
        assert_eq!(err.kind, nebula_error::ErrorKind::InvalidDefinition);
    }

    #[test]
    fn no_trigger_node_rejected() {
        let f = flow(vec![NodeDef::new(node(1), "noop")], vec![]);
        assert!(validate_flow(&f).is_err());
    }

    #[test]
    fn trigger_with_incoming_edge_rejected() {
        let f = flow(
            vec![
                NodeDef::new(node(1), "noop"),
                NodeDef::new(node(2), "trigger.manual").as_trigger(),
            ],
            vec![Edge::new(node(1), node(2))],
        );
        assert!(validate_flow(&f).is_err());
    }

    #[test]
    fn cyclic_flow_rejected() {
        let f = flow(
            vec![
                NodeDef::new(node(1), "trigger.manual").as_trigger(),
                NodeDef::new(node(2), "noop"),
                NodeDef::new(node(3), "noop"),
            ],
            vec![
                Edge::new(node(1), node(2)),
                Edge::new(node(2), node(3)),
                Edge::new(node(3), node(2)),
            ],
        );
        assert!(validate_flow(&f).is_err());
    }
}
