//! Reachability over parent links.
//!
//! Edges point from a child to each entry of its `parent_ids`. Deriving a
//! node never needs these checks because the child id is freshly minted;
//! any operation that links two existing nodes must call [`validate_link`]
//! first.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::node::Node;
use crate::types::NodeId;

fn find<'a>(nodes: &'a [Node], id: &NodeId) -> Option<&'a Node> {
    nodes.iter().find(|n| &n.id == id)
}

/// Every node reachable from `id` by following `parent_ids`, excluding `id`.
pub fn ancestors(nodes: &[Node], id: &NodeId) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&NodeId> = match find(nodes, id) {
        Some(node) => node.parent_ids.iter().collect(),
        None => return seen,
    };

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(node) = find(nodes, current) {
            stack.extend(node.parent_ids.iter());
        }
    }
    seen
}

/// Ids of nodes listing `id` as a parent, in store order.
pub fn children_of(nodes: &[Node], id: &NodeId) -> Vec<NodeId> {
    nodes
        .iter()
        .filter(|n| n.parent_ids.contains(id))
        .map(|n| n.id.clone())
        .collect()
}

/// Whether making `parent` a parent of `child` would close a cycle.
///
/// A cycle appears exactly when `child` is already `parent` itself or one
/// of `parent`'s ancestors.
pub fn would_create_cycle(nodes: &[Node], parent: &NodeId, child: &NodeId) -> bool {
    parent == child || ancestors(nodes, parent).contains(child)
}

/// Check that `parent -> child` can be added.
///
/// Returns `Ok(false)` when the link already exists (adding it again is a
/// no-op) and `Ok(true)` when it is new.
pub fn validate_link(nodes: &[Node], parent: &NodeId, child: &NodeId) -> Result<bool, CoreError> {
    if find(nodes, parent).is_none() {
        return Err(CoreError::node_not_found(parent));
    }
    let child_node = find(nodes, child).ok_or_else(|| CoreError::node_not_found(child))?;

    if parent == child {
        return Err(CoreError::Validation(format!(
            "Node {child} cannot be its own parent"
        )));
    }
    if child_node.parent_ids.contains(parent) {
        return Ok(false);
    }
    if would_create_cycle(nodes, parent, child) {
        return Err(CoreError::Conflict(format!(
            "Linking {parent} -> {child} would create a cycle"
        )));
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
