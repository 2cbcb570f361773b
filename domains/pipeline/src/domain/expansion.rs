//! Expand/collapse state for the hierarchy view
//!
//! Nodes are addressed by `(NodeClass, id)`. Ids are only unique within their
//! own collection, so a package and a shot may share a numeric id without
//! sharing expansion state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kinds of collapsible nodes in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    Package,
    Shot,
    Department,
}

impl std::fmt::Display for NodeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeClass::Package => write!(f, "package"),
            NodeClass::Shot => write!(f, "shot"),
            NodeClass::Department => write!(f, "department"),
        }
    }
}

/// Composite key of a collapsible node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub class: NodeClass,
    pub id: i64,
}

impl NodeKey {
    pub fn new(class: NodeClass, id: i64) -> Self {
        Self { class, id }
    }
}

/// Immutable set of expanded nodes.
///
/// Every mutation returns a new value; a caller holding an earlier state
/// keeps seeing that state, so comparing old and new detects changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionState {
    expanded: BTreeSet<NodeKey>,
}

impl ExpansionState {
    /// Empty state: every node collapsed
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one node between expanded and collapsed
    pub fn toggle(&self, class: NodeClass, id: i64) -> Self {
        let key = NodeKey::new(class, id);
        let mut expanded = self.expanded.clone();
        if !expanded.remove(&key) {
            expanded.insert(key);
        }
        Self { expanded }
    }

    /// Force a node into the given state
    pub fn with_expanded(&self, class: NodeClass, id: i64, expanded: bool) -> Self {
        if self.is_expanded(class, id) == expanded {
            return self.clone();
        }
        self.toggle(class, id)
    }

    /// Unseen nodes are collapsed
    pub fn is_expanded(&self, class: NodeClass, id: i64) -> bool {
        self.expanded.contains(&NodeKey::new(class, id))
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Expanded ids of one class, ascending
    pub fn expanded_ids(&self, class: NodeClass) -> Vec<i64> {
        self.expanded
            .iter()
            .filter(|key| key.class == class)
            .map(|key| key.id)
            .collect()
    }

    pub fn collapse_all(&self) -> Self {
        Self::default()
    }
}
