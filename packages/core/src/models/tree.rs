//! Nested read model
//!
//! `TreeNode` is what consumers render. It is produced by the read projector
//! and has no mutation path back into the store.

use serde::{Deserialize, Serialize};

use crate::models::Node;

/// A node with its ordered children attached
///
/// Serializes as the node's own fields flattened with a `children` array
/// (always present, empty for leaves):
///
/// ```json
/// {"id": "...", "key": "billing", "kind": "folder", "children": [ ... ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,

    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Ids in pre-order
    pub fn ids(&self) -> Vec<String> {
        let mut out = vec![self.node.id.clone()];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}
