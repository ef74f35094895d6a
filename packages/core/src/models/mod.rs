//! Data Models
//!
//! - `Node` - flat record stored per tree entry
//! - `TreeSnapshot` - arena of all nodes keyed by id, used by the engine
//! - `TreeNode` - nested projection handed to readers

mod node;
mod snapshot;
mod tree;

pub use node::{
    deserialize_parent_ref, validate_labels, DeleteResult, Node, NodeKind, NodeStatus,
    NodeUpdate, ValidationError, ROOT_PARENT_ID,
};
pub use snapshot::{sibling_order, TreeSnapshot};
pub use tree::TreeNode;
