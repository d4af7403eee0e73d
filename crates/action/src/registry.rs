//! The handler registry the coordinator consults to dispatch a node.

use std::collections::HashMap;
use std::sync::Arc;

use nebula_error::NebulaError;

use crate::handler::{NodeDescriptor, NodeHandler};

/// Maximum edit distance for [`HandlerRegistry::fuzzy_find`] to treat a
/// registered key as a plausible typo of the query.
const FUZZY_SUGGEST_DISTANCE: usize = 3;

/// Classic dynamic-programming Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, &ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let temp = row[j + 1];
            row[j + 1] = if ca == cb {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j + 1])
            };
            prev_diag = temp;
        }
    }
    row[b.len()]
}

/// A lookup table from `NodeDef.node_type` to the handler that implements it.
///
/// Registration happens once at startup; lookups happen on every dispatch,
/// so this is a plain `HashMap` rather than anything fancier.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own descriptor key.
    ///
    /// Replaces any handler previously registered under the same key.
    pub fn register(&mut self, handler: Arc<dyn NodeHandler>) {
        let key = handler.descriptor().key;
        self.handlers.insert(key, handler);
    }

    /// Look up a handler by its key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(key).cloned()
    }

    /// Look up a handler, or a structured `UnknownNodeType` error suggesting
    /// the closest registered key, if any is within [`FUZZY_SUGGEST_DISTANCE`].
    pub fn require(&self, key: &str) -> Result<Arc<dyn NodeHandler>, NebulaError> {
        self.get(key).ok_or_else(|| match self.fuzzy_find(key) {
            Some(suggestion) => NebulaError::new(
                nebula_error::ErrorKind::UnknownNodeType,
                format!("no handler registered for node type '{key}' (did you mean '{suggestion}'?)"),
            ),
            None => NebulaError::unknown_node_type(key),
        })
    }

    /// The registered key closest to `query` by Levenshtein distance, if any
    /// is within [`FUZZY_SUGGEST_DISTANCE`] edits.
    #[must_use]
    pub fn fuzzy_find(&self, query: &str) -> Option<&str> {
        self.handlers
            .keys()
            .map(|key| (key.as_str(), levenshtein(query, key)))
            .filter(|&(_, distance)| distance <= FUZZY_SUGGEST_DISTANCE)
            .min_by_key(|&(_, distance)| distance)
            .map(|(key, _)| key)
    }

    /// Descriptors for every registered handler, for catalog listings.
    pub fn list(&self) -> Vec<NodeDescriptor> {
        self.handlers.values().map(|h| h.descriptor()).collect()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
