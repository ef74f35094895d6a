//! Tree Operation Parameters
//!
//! Request types accepted by `TreeService` mutations, plus the drop-zone
//! resolver that turns drag geometry into a [`MoveNodeParams`].
//!
//! All types deserialize from the camelCase JSON bodies used by the HTTP
//! surface. Parent references accept `null` or `"root"` for the top level.

pub mod drop_zone;

pub use drop_zone::{DropIntent, DropZoneConfig, DropZoneResolver};

use serde::{Deserialize, Serialize};

use crate::models::{deserialize_parent_ref, NodeKind};

/// Parameters for `TreeService::add_node`
///
/// # Examples
///
/// ```rust
/// # use navtree_core::operations::CreateNodeParams;
/// # use navtree_core::models::NodeKind;
/// let params: CreateNodeParams = serde_json::from_str(
///     r#"{"parentId": "root", "kind": "folder", "label": "Billing", "labelZh": "计费"}"#,
/// ).unwrap();
/// assert_eq!(params.parent_id, None);
/// assert_eq!(params.kind, NodeKind::Folder);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    /// Owning folder; `None` for the top level
    #[serde(default, deserialize_with = "deserialize_parent_ref")]
    pub parent_id: Option<String>,
    pub kind: NodeKind,
    pub label: String,
    pub label_zh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CreateNodeParams {
    pub fn new(
        parent_id: Option<String>,
        kind: NodeKind,
        label: impl Into<String>,
        label_zh: impl Into<String>,
    ) -> Self {
        Self {
            parent_id,
            kind,
            label: label.into(),
            label_zh: label_zh.into(),
            description: None,
            icon: None,
        }
    }
}

/// Where a moved node lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovePosition {
    /// Sibling immediately before the anchor
    Before,
    /// Last child of the target folder
    Into,
    /// Sibling immediately after the anchor
    After,
}

impl MovePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovePosition::Before => "before",
            MovePosition::Into => "into",
            MovePosition::After => "after",
        }
    }
}

/// Parameters for `TreeService::move_node`
///
/// - `Into`: `target_parent_id` is the destination (`None` = top level)
/// - `Before` / `After`: `anchor_sibling_id` is required and the destination
///   is the anchor's parent. `target_parent_id` may be omitted; if given it
///   must match the anchor's parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNodeParams {
    #[serde(rename = "id")]
    pub node_id: String,
    #[serde(default, deserialize_with = "deserialize_parent_ref")]
    pub target_parent_id: Option<String>,
    pub position: MovePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_sibling_id: Option<String>,
}

impl MoveNodeParams {
    pub fn into_parent(node_id: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            node_id: node_id.into(),
            target_parent_id: parent_id,
            position: MovePosition::Into,
            anchor_sibling_id: None,
        }
    }

    pub fn before(node_id: impl Into<String>, anchor_id: impl Into<String>) -> Self {
        Self::beside(node_id, anchor_id, MovePosition::Before)
    }

    pub fn after(node_id: impl Into<String>, anchor_id: impl Into<String>) -> Self {
        Self::beside(node_id, anchor_id, MovePosition::After)
    }

    fn beside(
        node_id: impl Into<String>,
        anchor_id: impl Into<String>,
        position: MovePosition,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            target_parent_id: None,
            position,
            anchor_sibling_id: Some(anchor_id.into()),
        }
    }

    /// Pin the expected destination parent (checked against the anchor's)
    pub fn with_target_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.target_parent_id = Some(parent_id.into());
        self
    }
}

/// Parameters for `TreeService::reorder_nodes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderParams {
    #[serde(default, deserialize_with = "deserialize_parent_ref")]
    pub parent_id: Option<String>,
    pub ordered_ids: Vec<String>,
}
