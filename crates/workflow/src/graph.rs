//! The executable dependency graph derived from a [`FlowDefinition`].

use std::collections::HashMap;

use nebula_core::NodeId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::types::{Edge, FlowDefinition};

/// The DAG built from a flow's nodes and edges, indexed for O(1) neighbor lookup.
///
/// This is the structure the coordinator walks level by level; it holds no
/// execution state of its own (see `nebula_execution` for that).
pub struct DependencyGraph {
    graph: DiGraph<NodeId, Option<String>>,
    index_of: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    /// Build a graph from a flow's nodes and edges.
    ///
    /// Assumes the flow already passed [`crate::validate::validate_flow`]; it
    /// does not re-check for dangling edges or duplicate node ids.
    #[must_use]
    pub fn build(nodes: &[crate::types::NodeDef], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let idx = graph.add_node(node.id);
            index_of.insert(node.id, idx);
        }
        for edge in edges {
            if let (Some(&src), Some(&dst)) =
                (index_of.get(&edge.source_id), index_of.get(&edge.target_id))
            {
                graph.add_edge(src, dst, edge.source_handle.clone());
            }
        }
        Self { graph, index_of }
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct predecessors of a node, each tagged with the handle they must fire on.
    pub fn predecessors(&self, id: NodeId) -> Vec<(NodeId, Option<String>)> {
        let Some(&idx) = self.index_of.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (self.graph[e.source()], e.weight().clone()))
            .collect()
    }

    /// Direct successors of a node, each tagged with the handle the edge leaves on.
    pub fn successors(&self, id: NodeId) -> Vec<(NodeId, Option<String>)> {
        let Some(&idx) = self.index_of.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()], e.weight().clone()))
            .collect()
    }

    /// Nodes with no incoming edges — the graph's natural entrypoints.
    pub fn roots(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx])
            .collect()
    }

    /// Returns `true` if the graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// A topological ordering of node ids, or `None` if the graph has a cycle.
    #[must_use]
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        petgraph::algo::toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|idx| self.graph[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeDef;

    fn node(n: u8) -> NodeId {
        // deterministic ids for test readability
        NodeId::parse(&format!("00000000-0000-0000-0000-{n:012}")).unwrap()
    }

    #[test]
    fn linear_graph_predecessors_and_successors() {
        let nodes = vec![
            NodeDef::new(node(1), "trigger.manual").as_trigger(),
            NodeDef::new(node(2), "http.request"),
            NodeDef::new(node(3), "log.write"),
        ];
        let edges = vec![Edge::new(node(1), node(2)), Edge::new(node(2), node(3))];
        let graph = DependencyGraph::build(&nodes, &edges);

        assert_eq!(graph.predecessors(node(2)), vec![(node(1), None)]);
        assert_eq!(graph.successors(node(2)), vec![(node(3), None)]);
        assert_eq!(graph.roots(), vec![node(1)]);
        assert!(!graph.has_cycle());
    }

    #[test]
    fn diamond_graph_has_no_cycle_and_topo_order_respects_edges() {
        let nodes = vec![
            NodeDef::new(node(1), "trigger.manual").as_trigger(),
            NodeDef::new(node(2), "noop"),
            NodeDef::new(node(3), "noop"),
            NodeDef::new(node(4), "noop"),
        ];
        let edges = vec![
            Edge::new(node(1), node(2)),
            Edge::new(node(1), node(3)),
            Edge::new(node(2), node(4)),
            Edge::new(node(3), node(4)),
        ];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert!(!graph.has_cycle());
        let order = graph.topological_order().unwrap();
        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(node(1)) < pos(node(2)));
        assert!(pos(node(2)) < pos(node(4)));
        assert!(pos(node(3)) < pos(node(4)));
    }

    #[test]
    fn cyclic_graph_is_detected() {
        let nodes = vec![NodeDef::new(node(1), "a"), NodeDef::new(node(2), "b")];
        let edges = vec![Edge::new(node(1), node(2)), Edge::new(node(2), node(1))];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert!(graph.has_cycle());
        assert!(graph.topological_order().is_none());
    }

    #[test]
    fn handle_tagged_edges_preserve_handle_name() {
        let nodes = vec![
            NodeDef::new(node(1), "branch"),
            NodeDef::new(node(2), "true_path"),
        ];
        let edges = vec![Edge::on_handle(node(1), "true", node(2))];
        let graph = DependencyGraph::build(&nodes, &edges);
        assert_eq!(
            graph.predecessors(node(2)),
            vec![(node(1), Some("true".to_string()))]
        );
    }
}
