//! Ready-set computation, handle suppression, and input resolution.
//!
//! This is the pure decision-making half of spec.md §4.3: given the current
//! per-node state and the live output handles of every terminal node, which
//! nodes are ready to dispatch, which are skipped, and what input does each
//! ready node receive? No I/O and no handler knowledge lives here — the
//! coordinator drives a loop around [`ready_and_skipped`].

use std::collections::HashMap;

use nebula_core::NodeId;
use nebula_workflow::DependencyGraph;
use serde_json::{Map, Value};

/// What a terminal node contributes to its outgoing edges.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    /// Not yet terminal; every incoming edge from this source blocks its targets.
    Pending,
    /// Completed (or failed-with-continue) with this set of emitted handles.
    /// An empty vec means only the default (unnamed) handle is live.
    Live(Vec<String>),
    /// Terminal with nothing live — skipped, or a stopped failure. No
    /// outgoing edge from this node, including the default handle, is live.
    Suppressed,
}

/// Classifies one incoming edge against its source's outcome.
enum EdgeClass {
    Blocked,
    Live,
    Suppressed,
}

fn classify(outcome: &NodeOutcome, handle: Option<&str>) -> EdgeClass {
    match outcome {
        NodeOutcome::Pending => EdgeClass::Blocked,
        NodeOutcome::Suppressed => EdgeClass::Suppressed,
        NodeOutcome::Live(handles) => match handle {
            None => EdgeClass::Live,
            Some(h) => {
                if handles.iter().any(|emitted| emitted == h) {
                    EdgeClass::Live
                } else {
                    EdgeClass::Suppressed
                }
            }
        },
    }
}

/// The result of one readiness pass over the pending nodes of a flow.
#[derive(Debug, Default)]
pub struct ReadyWave {
    /// Nodes whose predecessors are all satisfied; dispatch these next, in
    /// ascending `NodeId` string order per spec.md §4.3 step 6's tie-break.
    pub ready: Vec<NodeId>,
    /// Nodes every incoming edge of which was suppressed — mark `Skipped`.
    pub skipped: Vec<NodeId>,
}

/// Compute the next wave of ready and newly-skipped nodes.
///
/// `pending` is the set of nodes still in `NodeState::Pending`; `outcomes`
/// carries every other node's terminal classification (trigger nodes should
/// be seeded as `Live(vec![])` by the caller before the first call, since
/// they have no predecessors and spec.md §4.3 step 1 treats them as the
/// initial ready set).
#[must_use]
pub fn ready_and_skipped(
    graph: &DependencyGraph,
    pending: &[NodeId],
    outcomes: &HashMap<NodeId, NodeOutcome>,
) -> ReadyWave {
    let mut wave = ReadyWave::default();

    for &node_id in pending {
        let predecessors = graph.predecessors(node_id);
        if predecessors.is_empty() {
            // Only reachable for non-trigger nodes with no incoming edges;
            // treat as immediately ready (isolated node).
            wave.ready.push(node_id);
            continue;
        }

        let mut any_live = false;
        let mut any_blocked = false;
        let mut all_suppressed = true;

        for (source_id, handle) in &predecessors {
            let outcome = outcomes.get(source_id).unwrap_or(&NodeOutcome::Pending);
            match classify(outcome, handle.as_deref()) {
                EdgeClass::Blocked => {
                    any_blocked = true;
                    all_suppressed = false;
                }
                EdgeClass::Live => {
                    any_live = true;
                    all_suppressed = false;
                }
                EdgeClass::Suppressed => {}
            }
        }

        if any_blocked {
            continue; // still pending; some predecessor hasn't finished
        }
        if all_suppressed {
            wave.skipped.push(node_id);
        } else if any_live {
            wave.ready.push(node_id);
        }
    }

    wave.ready.sort_by_key(|id| id.to_string());
    wave.skipped.sort_by_key(|id| id.to_string());
    wave
}

/// Resolve a node's input from the outputs of its live predecessors.
///
/// Edges are considered in ascending `(sourceId, sourceHandle)` order (the
/// tie-break spec.md §4.3 step 2 calls for) and their outputs deep-merged;
/// later (lexicographically larger) sources win on key conflicts. Nodes with
/// no live incoming edge (a trigger, or every predecessor suppressed on a
/// path that still let this node become ready through another edge) resolve
/// to an empty object.
#[must_use]
pub fn resolve_input(
    graph: &DependencyGraph,
    node_id: NodeId,
    outcomes: &HashMap<NodeId, NodeOutcome>,
    node_outputs: &HashMap<NodeId, Value>,
) -> Value {
    let mut live_edges: Vec<(NodeId, Option<String>)> = graph
        .predecessors(node_id)
        .into_iter()
        .filter(|(source_id, handle)| {
            let outcome = outcomes.get(source_id).unwrap_or(&NodeOutcome::Pending);
            matches!(classify(outcome, handle.as_deref()), EdgeClass::Live)
        })
        .collect();

    live_edges.sort_by(|a, b| {
        let key_a = (a.0.to_string(), a.1.clone().unwrap_or_default());
        let key_b = (b.0.to_string(), b.1.clone().unwrap_or_default());
        key_a.cmp(&key_b)
    });

    let mut acc = Value::Object(Map::new());
    for (source_id, _) in &live_edges {
        if let Some(output) = node_outputs.get(source_id) {
            deep_merge(&mut acc, output);
        }
    }
    acc
}

/// Merge `from` into `to`, recursing into matching object keys and letting
/// `from` win on any scalar, array, or type conflict.
fn deep_merge(to: &mut Value, from: &Value) {
    match (to, from) {
        (Value::Object(to_map), Value::Object(from_map)) => {
            for (k, v) in from_map {
                match to_map.get_mut(k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        to_map.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (to_slot, from_value) => {
            *to_slot = from_value.clone();
        }
    }
}
