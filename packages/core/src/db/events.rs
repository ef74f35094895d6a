//! Tree change events
//!
//! Emitted by `TreeService` on a tokio broadcast channel after each committed
//! mutation. Clients holding a cached projection subscribe and refetch.
//!
//! # Event Flow
//!
//! 1. `TreeService` commits a batch to the store
//! 2. One `TreeEvent` is sent on the broadcast channel
//! 3. Subscribers (e.g. a push layer in the server) receive it asynchronously

use crate::models::Node;
use serde::{Deserialize, Serialize};

/// Placement of a node among its siblings after a structural change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub node_id: String,
    pub parent_id: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TreeEvent {
    #[serde(rename = "node:created")]
    NodeCreated { node: Node },

    #[serde(rename = "node:updated")]
    NodeUpdated { node: Node },

    #[serde(rename = "nodes:deleted")]
    NodesDeleted { ids: Vec<String> },

    /// A move; `placements` lists every sibling whose order was rewritten
    #[serde(rename = "node:moved")]
    NodeMoved {
        node_id: String,
        placements: Vec<Placement>,
    },

    #[serde(rename = "children:reordered")]
    ChildrenReordered {
        parent_id: Option<String>,
        ordered_ids: Vec<String>,
    },
}

impl TreeEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TreeEvent::NodeCreated { .. } => "node:created",
            TreeEvent::NodeUpdated { .. } => "node:updated",
            TreeEvent::NodesDeleted { .. } => "nodes:deleted",
            TreeEvent::NodeMoved { .. } => "node:moved",
            TreeEvent::ChildrenReordered { .. } => "children:reordered",
        }
    }
}
