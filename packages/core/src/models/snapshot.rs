//! Flat arena view of the tree
//!
//! A `TreeSnapshot` holds every node keyed by id. The engine reads one per
//! mutation, derives a `WriteBatch`, and validates the candidate snapshot
//! produced by `with_batch` before anything is committed.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::db::{SiblingOrderCalculator, WriteBatch};
use crate::models::Node;

/// Total order among siblings: `sort_order`, then `id`.
pub fn sibling_order(a: &Node, b: &Node) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSnapshot {
    nodes: HashMap<String, Node>,
}

impl TreeSnapshot {
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes.into_values().collect()
    }

    /// Children of `parent` (`None` = top level) in sibling order
    pub fn children_of(&self, parent: Option<&str>) -> Vec<&Node> {
        let mut children: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == parent)
            .collect();
        children.sort_by(|a, b| sibling_order(a, b));
        children
    }

    pub fn child_ids(&self, parent: Option<&str>) -> Vec<String> {
        self.children_of(parent)
            .into_iter()
            .map(|n| n.id.clone())
            .collect()
    }

    /// Order value that appends after the current last child
    pub fn next_sort_order(&self, parent: Option<&str>) -> i64 {
        let orders: Vec<i64> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == parent)
            .map(|n| n.sort_order)
            .collect();
        SiblingOrderCalculator::append_order(&orders)
    }

    /// `id` followed by all of its descendants in pre-order.
    ///
    /// Returns an empty list when `id` is unknown. A visited set keeps
    /// corrupt (cyclic) data from looping.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        if !self.contains(id) {
            return Vec::new();
        }

        let mut children_by_parent: HashMap<&str, Vec<&Node>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(parent) = node.parent_id.as_deref() {
                children_by_parent.entry(parent).or_default().push(node);
            }
        }
        for children in children_by_parent.values_mut() {
            children.sort_by(|a, b| sibling_order(a, b));
        }

        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current.to_string());
            if let Some(children) = children_by_parent.get(current) {
                for child in children.iter().rev() {
                    stack.push(child.id.as_str());
                }
            }
        }
        out
    }

    /// Candidate state after applying `batch`. Deletes run before puts.
    pub fn with_batch(&self, batch: &WriteBatch) -> TreeSnapshot {
        let mut next = self.clone();
        next.apply(batch);
        next
    }

    pub fn apply(&mut self, batch: &WriteBatch) {
        for id in &batch.deletes {
            self.nodes.remove(id);
        }
        for node in &batch.puts {
            self.nodes.insert(node.id.clone(), node.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    fn node(kind: NodeKind, key: &str, parent: Option<&str>, order: i64) -> Node {
        let mut n = Node::new(
            kind,
            key.to_string(),
            parent.map(str::to_string),
            key.to_string(),
            key.to_string(),
            order,
        );
        n.id = key.to_string();
        n
    }

    fn sample() -> TreeSnapshot {
        TreeSnapshot::from_nodes(vec![
            node(NodeKind::Folder, "f1", None, 0),
            node(NodeKind::Folder, "f2", Some("f1"), 3),
            node(NodeKind::Module, "m1", Some("f1"), 1),
            node(NodeKind::Module, "m2", Some("f2"), 0),
            node(NodeKind::Module, "m3", None, 1),
        ])
    }

    #[test]
    fn test_children_are_sorted() {
        let snapshot = sample();
        assert_eq!(snapshot.child_ids(Some("f1")), vec!["m1", "f2"]);
        assert_eq!(snapshot.child_ids(None), vec!["f1", "m3"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let snapshot = TreeSnapshot::from_nodes(vec![
            node(NodeKind::Module, "b", None, 0),
            node(NodeKind::Module, "a", None, 0),
        ]);
        assert_eq!(snapshot.child_ids(None), vec!["a", "b"]);
    }

    #[test]
    fn test_next_sort_order() {
        let snapshot = sample();
        assert_eq!(snapshot.next_sort_order(Some("f1")), 4);
        assert_eq!(snapshot.next_sort_order(Some("m1")), 0);
    }

    #[test]
    fn test_subtree_ids_preorder() {
        let snapshot = sample();
        assert_eq!(snapshot.subtree_ids("f1"), vec!["f1", "m1", "f2", "m2"]);
        assert_eq!(snapshot.subtree_ids("m3"), vec!["m3"]);
        assert!(snapshot.subtree_ids("missing").is_empty());
    }

    #[test]
    fn test_with_batch_does_not_touch_original() {
        let snapshot = sample();
        let mut moved = snapshot.get("m3").cloned().unwrap();
        moved.parent_id = Some("f2".to_string());
        let batch = WriteBatch {
            puts: vec![moved],
            deletes: vec!["m1".to_string()],
        };

        let candidate = snapshot.with_batch(&batch);
        assert!(snapshot.contains("m1"));
        assert!(!candidate.contains("m1"));
        assert_eq!(candidate.child_ids(Some("f2")), vec!["m2", "m3"]);
    }
}
