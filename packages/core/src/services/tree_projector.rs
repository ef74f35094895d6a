//! Read projection
//!
//! Turns the flat record set into nested [`TreeNode`]s. Children are grouped
//! by parent with a single pass (adjacency list), then ordered by
//! `(sort_order, id)`.
//!
//! Records whose parent is absent are omitted with a warning instead of being
//! promoted to the top level.

use std::collections::{HashMap, HashSet};

use crate::models::{sibling_order, Node, TreeNode};

pub struct TreeProjector;

impl TreeProjector {
    /// Full forest, top-level nodes first in sibling order
    pub fn project(nodes: Vec<Node>) -> Vec<TreeNode> {
        let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let mut children = group_by_parent(nodes, &ids);

        let roots = children.remove(&None).unwrap_or_default();
        let mut visited = HashSet::new();
        roots
            .into_iter()
            .filter_map(|root| build(root, &mut children, &mut visited))
            .collect()
    }

    /// The subtree rooted at `id`, or `None` if it does not exist
    pub fn project_subtree(nodes: Vec<Node>, id: &str) -> Option<TreeNode> {
        let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let mut children = group_by_parent(nodes, &ids);

        let root = children
            .values_mut()
            .find_map(|siblings| {
                siblings
                    .iter()
                    .position(|n| n.id == id)
                    .map(|pos| siblings.remove(pos))
            })?;

        let mut visited = HashSet::new();
        build(root, &mut children, &mut visited)
    }
}

fn group_by_parent(nodes: Vec<Node>, ids: &HashSet<String>) -> HashMap<Option<String>, Vec<Node>> {
    let mut children: HashMap<Option<String>, Vec<Node>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            if !ids.contains(parent) {
                tracing::warn!(
                    node_id = %node.id,
                    parent_id = %parent,
                    "Omitting orphaned node from tree projection"
                );
                continue;
            }
        }
        children.entry(node.parent_id.clone()).or_default().push(node);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(sibling_order);
    }
    children
}

fn build(
    node: Node,
    children: &mut HashMap<Option<String>, Vec<Node>>,
    visited: &mut HashSet<String>,
) -> Option<TreeNode> {
    if !visited.insert(node.id.clone()) {
        tracing::warn!(node_id = %node.id, "Cycle in stored hierarchy; node projected once");
        return None;
    }

    let kids = children.remove(&Some(node.id.clone())).unwrap_or_default();
    let kids = kids
        .into_iter()
        .filter_map(|child| build(child, children, visited))
        .collect();

    Some(TreeNode {
        node,
        children: kids,
    })
}
