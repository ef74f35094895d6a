//! Tree Invariant Checker
//!
//! Pure admit/reject logic over a [`TreeSnapshot`]. Nothing here mutates
//! state; every check returns the violated invariant or `Ok(())`.
//!
//! The engine calls the targeted checks (`check_acyclic`,
//! `check_parent_capacity`, `check_key_unique`, `check_sibling_order`) on the
//! candidate state of each mutation. [`TreeInvariantChecker::check_tree`]
//! audits a whole snapshot and backs diagnostics and property tests.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::models::{NodeKind, TreeSnapshot, ROOT_PARENT_ID};

/// The structural rules every committed tree satisfies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Invariant {
    /// No node is its own ancestor
    Acyclic,
    /// Every parent exists and is a folder
    ParentCapacity,
    /// Keys are unique across the tree
    KeyUnique,
    /// Sibling sort orders are distinct
    SiblingOrder,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum InvariantViolation {
    #[error("{}", cycle_message(.node_id, .parent_id))]
    CycleDetected { node_id: String, parent_id: String },

    #[error("parent {parent_id} {reason}")]
    InvalidParent { parent_id: String, reason: String },

    /// `existing_id` holds the key first; `node_id` is the node that collides
    #[error("key '{key}' is already used by node {existing_id}")]
    DuplicateKey {
        key: String,
        existing_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },

    #[error("children of {} share sort order {sort_order}: {}", parent_display(.parent_id), .ids.join(", "))]
    OrderConflict {
        parent_id: Option<String>,
        sort_order: i64,
        ids: Vec<String>,
    },
}

impl InvariantViolation {
    pub fn invariant(&self) -> Invariant {
        match self {
            Self::CycleDetected { .. } => Invariant::Acyclic,
            Self::InvalidParent { .. } => Invariant::ParentCapacity,
            Self::DuplicateKey { .. } => Invariant::KeyUnique,
            Self::OrderConflict { .. } => Invariant::SiblingOrder,
        }
    }
}

fn cycle_message(node_id: &str, parent_id: &str) -> String {
    if node_id == parent_id {
        format!("cannot move node {} into itself", node_id)
    } else {
        format!(
            "cannot move node {} into its own descendant {}",
            node_id, parent_id
        )
    }
}

fn parent_display(parent_id: &Option<String>) -> &str {
    parent_id.as_deref().unwrap_or(ROOT_PARENT_ID)
}

pub struct TreeInvariantChecker;

impl TreeInvariantChecker {
    /// Reject if placing `node_id` under `new_parent` would create a cycle
    ///
    /// Walks ancestors from `new_parent` upward. `new_parent == node_id`
    /// is a cycle. The walk is bounded by the snapshot size, so an already
    /// corrupt chain is reported instead of looping.
    pub fn check_acyclic(
        snapshot: &TreeSnapshot,
        node_id: &str,
        new_parent: Option<&str>,
    ) -> Result<(), InvariantViolation> {
        let Some(start) = new_parent else {
            return Ok(());
        };

        let violation = || InvariantViolation::CycleDetected {
            node_id: node_id.to_string(),
            parent_id: start.to_string(),
        };

        let mut current = Some(start);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == node_id {
                return Err(violation());
            }
            steps += 1;
            if steps > snapshot.len() {
                return Err(violation());
            }
            current = snapshot.get(id).and_then(|n| n.parent_id.as_deref());
        }
        Ok(())
    }

    /// Reject if another node already uses `key`
    pub fn check_key_unique(
        snapshot: &TreeSnapshot,
        key: &str,
        excluding_id: Option<&str>,
    ) -> Result<(), InvariantViolation> {
        match snapshot
            .nodes()
            .find(|n| n.key == key && Some(n.id.as_str()) != excluding_id)
        {
            Some(existing) => Err(InvariantViolation::DuplicateKey {
                key: key.to_string(),
                existing_id: existing.id.clone(),
                node_id: excluding_id.map(str::to_string),
            }),
            None => Ok(()),
        }
    }

    /// Reject if `parent` is missing or is a module. The root always passes.
    pub fn check_parent_capacity(
        snapshot: &TreeSnapshot,
        parent: Option<&str>,
    ) -> Result<(), InvariantViolation> {
        let Some(parent_id) = parent else {
            return Ok(());
        };

        match snapshot.get(parent_id) {
            None => Err(InvariantViolation::InvalidParent {
                parent_id: parent_id.to_string(),
                reason: "does not exist".to_string(),
            }),
            Some(node) if node.kind == NodeKind::Module => Err(InvariantViolation::InvalidParent {
                parent_id: parent_id.to_string(),
                reason: "is a module and cannot have children".to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Reject if two children of `parent` share a sort order
    pub fn check_sibling_order(
        snapshot: &TreeSnapshot,
        parent: Option<&str>,
    ) -> Result<(), InvariantViolation> {
        let mut by_order: HashMap<i64, Vec<String>> = HashMap::new();
        for child in snapshot.children_of(parent) {
            by_order
                .entry(child.sort_order)
                .or_default()
                .push(child.id.clone());
        }

        let mut conflicts: Vec<(i64, Vec<String>)> = by_order
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect();
        conflicts.sort_by_key(|(order, _)| *order);

        match conflicts.into_iter().next() {
            Some((sort_order, mut ids)) => {
                ids.sort();
                Err(InvariantViolation::OrderConflict {
                    parent_id: parent.map(str::to_string),
                    sort_order,
                    ids,
                })
            }
            None => Ok(()),
        }
    }

    /// Every violation present in `snapshot`, in a stable order
    pub fn check_tree(snapshot: &TreeSnapshot) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        let mut parents: HashSet<Option<&str>> = HashSet::new();
        parents.insert(None);

        for node in snapshot.nodes() {
            parents.insert(node.parent_id.as_deref());

            if let Some(parent_id) = node.parent_id.as_deref() {
                if let Err(v) = Self::check_parent_capacity(snapshot, Some(parent_id)) {
                    violations.push(v);
                }
            }

            if Self::has_ancestor_cycle(snapshot, &node.id) {
                violations.push(InvariantViolation::CycleDetected {
                    node_id: node.id.clone(),
                    parent_id: node.parent_id.clone().unwrap_or_default(),
                });
            }
        }

        let mut by_key: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in snapshot.nodes() {
            by_key.entry(node.key.as_str()).or_default().push(node.id.as_str());
        }
        for (key, mut ids) in by_key {
            if ids.len() > 1 {
                ids.sort_unstable();
                let holder = ids[0];
                for duplicate in &ids[1..] {
                    violations.push(InvariantViolation::DuplicateKey {
                        key: key.to_string(),
                        existing_id: holder.to_string(),
                        node_id: Some(duplicate.to_string()),
                    });
                }
            }
        }

        for parent in parents {
            if let Err(v) = Self::check_sibling_order(snapshot, parent) {
                violations.push(v);
            }
        }

        violations.sort_by_key(|v| v.to_string());
        violations.dedup();
        violations
    }

    fn has_ancestor_cycle(snapshot: &TreeSnapshot, node_id: &str) -> bool {
        let mut seen = HashSet::new();
        seen.insert(node_id);
        let mut current = snapshot.get(node_id).and_then(|n| n.parent_id.as_deref());
        while let Some(id) = current {
            if !seen.insert(id) {
                return true;
            }
            current = snapshot.get(id).and_then(|n| n.parent_id.as_deref());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    fn node(kind: NodeKind, id: &str, parent: Option<&str>, order: i64) -> Node {
        let mut n = Node::new(
            kind,
            id.to_string(),
            parent.map(str::to_string),
            id.to_string(),
            id.to_string(),
            order,
        );
        n.id = id.to_string();
        n
    }

    /// f1 ─┬─ f2 ── m2
    ///     └─ m1
    fn sample() -> TreeSnapshot {
        TreeSnapshot::from_nodes(vec![
            node(NodeKind::Folder, "f1", None, 0),
            node(NodeKind::Folder, "f2", Some("f1"), 0),
            node(NodeKind::Module, "m1", Some("f1"), 1),
            node(NodeKind::Module, "m2", Some("f2"), 0),
        ])
    }

    #[test]
    fn test_acyclic_allows_unrelated_parent() {
        let s = sample();
        assert!(TreeInvariantChecker::check_acyclic(&s, "f2", None).is_ok());
        assert!(TreeInvariantChecker::check_acyclic(&s, "m1", Some("f2")).is_ok());
    }

    #[test]
    fn test_acyclic_rejects_self_and_descendants() {
        let s = sample();
        let err = TreeInvariantChecker::check_acyclic(&s, "f1", Some("f1")).unwrap_err();
        assert_eq!(err.invariant(), Invariant::Acyclic);
        assert_eq!(err.to_string(), "cannot move node f1 into itself");

        let err = TreeInvariantChecker::check_acyclic(&s, "f1", Some("f2")).unwrap_err();
        assert_eq!(err.to_string(), "cannot move node f1 into its own descendant f2");
    }

    #[test]
    fn test_acyclic_terminates_on_corrupt_chain() {
        let s = TreeSnapshot::from_nodes(vec![
            node(NodeKind::Folder, "a", Some("b"), 0),
            node(NodeKind::Folder, "b", Some("a"), 0),
        ]);
        assert!(TreeInvariantChecker::check_acyclic(&s, "x", Some("a")).is_err());
    }

    #[test]
    fn test_key_unique() {
        let s = sample();
        let err = TreeInvariantChecker::check_key_unique(&s, "m1", None).unwrap_err();
        assert_eq!(err.invariant(), Invariant::KeyUnique);
        assert!(TreeInvariantChecker::check_key_unique(&s, "m1", Some("m1")).is_ok());

        let err = TreeInvariantChecker::check_key_unique(&s, "m1", Some("m2")).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::DuplicateKey {
                key: "m1".to_string(),
                existing_id: "m1".to_string(),
                node_id: Some("m2".to_string()),
            }
        );
        assert!(TreeInvariantChecker::check_key_unique(&s, "fresh", None).is_ok());
    }

    #[test]
    fn test_parent_capacity() {
        let s = sample();
        assert!(TreeInvariantChecker::check_parent_capacity(&s, None).is_ok());
        assert!(TreeInvariantChecker::check_parent_capacity(&s, Some("f2")).is_ok());

        let err = TreeInvariantChecker::check_parent_capacity(&s, Some("m1")).unwrap_err();
        assert_eq!(err.invariant(), Invariant::ParentCapacity);

        let err = TreeInvariantChecker::check_parent_capacity(&s, Some("ghost")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_sibling_order_conflict() {
        let mut nodes = sample().into_nodes();
        nodes.push(node(NodeKind::Module, "m3", Some("f1"), 1));
        let s = TreeSnapshot::from_nodes(nodes);

        let err = TreeInvariantChecker::check_sibling_order(&s, Some("f1")).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::OrderConflict {
                parent_id: Some("f1".to_string()),
                sort_order: 1,
                ids: vec!["m1".to_string(), "m3".to_string()],
            }
        );
        assert!(TreeInvariantChecker::check_sibling_order(&s, Some("f2")).is_ok());
    }

    #[test]
    fn test_check_tree_clean() {
        assert!(TreeInvariantChecker::check_tree(&sample()).is_empty());
        assert!(TreeInvariantChecker::check_tree(&TreeSnapshot::default()).is_empty());
    }

    #[test]
    fn test_check_tree_reports_every_rule() {
        let mut nodes = sample().into_nodes();
        // child of a module
        nodes.push(node(NodeKind::Module, "under-module", Some("m1"), 0));
        // duplicate key
        let mut dup = node(NodeKind::Module, "dup", Some("f2"), 5);
        dup.key = "m2".to_string();
        nodes.push(dup);
        // cycle
        nodes.push(node(NodeKind::Folder, "c1", Some("c2"), 0));
        nodes.push(node(NodeKind::Folder, "c2", Some("c1"), 0));
        // order clash at root
        nodes.push(node(NodeKind::Folder, "r2", None, 0));

        let found: HashSet<Invariant> = TreeInvariantChecker::check_tree(&TreeSnapshot::from_nodes(nodes))
            .iter()
            .map(InvariantViolation::invariant)
            .collect();

        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_check_tree_names_first_key_holder() {
        let mut nodes = sample().into_nodes();
        for (id, order) in [("z-copy", 7), ("y-copy", 8)] {
            let mut copy = node(NodeKind::Module, id, Some("f2"), order);
            copy.key = "m2".to_string();
            nodes.push(copy);
        }

        let duplicates: Vec<InvariantViolation> =
            TreeInvariantChecker::check_tree(&TreeSnapshot::from_nodes(nodes))
                .into_iter()
                .filter(|v| v.invariant() == Invariant::KeyUnique)
                .collect();

        assert_eq!(duplicates.len(), 2);
        for violation in &duplicates {
            let InvariantViolation::DuplicateKey {
                existing_id,
                node_id,
                ..
            } = violation
            else {
                panic!("expected a duplicate key violation");
            };
            assert_eq!(existing_id, "m2");
            assert_ne!(node_id.as_deref(), Some("m2"));
        }
        let colliding: HashSet<_> = duplicates
            .iter()
            .filter_map(|v| match v {
                InvariantViolation::DuplicateKey { node_id, .. } => node_id.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(colliding, HashSet::from(["y-copy".to_string(), "z-copy".to_string()]));
    }
}
