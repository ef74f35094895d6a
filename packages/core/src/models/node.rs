//! Node Data Structures
//!
//! This module defines the `Node` record stored by the tree engine and the
//! partial update type used by `TreeService::update_node`.
//!
//! # Architecture
//!
//! - **Flat records**: nodes reference their parent by id; nesting only exists
//!   in the read projection (`TreeNode`)
//! - **Two kinds**: `Folder` nodes own children, `Module` nodes are leaves
//! - **Stable identity**: `id` and `key` never change after creation
//!
//! # Examples
//!
//! ```rust
//! use navtree_core::models::{Node, NodeKind};
//!
//! let folder = Node::new(
//!     NodeKind::Folder,
//!     "requirements".to_string(),
//!     None,
//!     "Requirements".to_string(),
//!     "需求".to_string(),
//!     0,
//! );
//! assert!(folder.parent_id.is_none());
//! assert!(folder.can_have_children());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Wire value that stands for "no parent" (top level of the tree).
pub const ROOT_PARENT_ID: &str = "root";

/// Validation errors for node input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{0}' must not be blank")]
    BlankField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),
}

/// Structural variant of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// May hold children of either kind
    Folder,
    /// Leaf; never has children
    Module,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::Module => "module",
        }
    }
}

/// Editorial status. Informational only, never affects structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Draft,
    Ready,
}

/// A single entry of the navigation tree.
///
/// # Fields
///
/// - `id`: UUID assigned at creation, immutable
/// - `key`: URL-safe slug, unique across the tree, immutable
/// - `parent_id`: owning folder, `None` for top-level nodes
/// - `kind`: `Folder` or `Module`
/// - `label` / `label_zh`: display names (both required)
/// - `sort_order`: position among siblings; ties broken by `id`
///
/// On the wire `parentId` is `null` for top-level nodes. When deserializing,
/// the literal `"root"` is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub key: String,

    #[serde(default, deserialize_with = "deserialize_parent_ref")]
    pub parent_id: Option<String>,

    pub kind: NodeKind,

    pub label: String,

    pub label_zh: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: NodeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    pub sort_order: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with a fresh UUID and `Draft` status
    pub fn new(
        kind: NodeKind,
        key: String,
        parent_id: Option<String>,
        label: String,
        label_zh: String,
        sort_order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            key,
            parent_id,
            kind,
            label,
            label_zh,
            description: None,
            status: NodeStatus::Draft,
            icon: None,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the record in isolation (no tree context)
    ///
    /// Structural rules that need the rest of the tree (parent existence,
    /// key uniqueness, cycles) live in the invariant checker.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.key.is_empty() {
            return Err(ValidationError::MissingField("key".to_string()));
        }

        validate_labels(&self.label, &self.label_zh)?;

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        Ok(())
    }

    pub fn can_have_children(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Both display names are required and must contain non-whitespace text.
pub fn validate_labels(label: &str, label_zh: &str) -> Result<(), ValidationError> {
    if label.trim().is_empty() {
        return Err(ValidationError::BlankField("label".to_string()));
    }
    if label_zh.trim().is_empty() {
        return Err(ValidationError::BlankField("labelZh".to_string()));
    }
    Ok(())
}

/// Accepts `null`, a missing field, `""` or `"root"` as the root sentinel.
pub fn deserialize_parent_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|id| !id.is_empty() && id != ROOT_PARENT_ID))
}

/// Custom deserializer for nullable fields in PATCH bodies
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (clear)
/// - "value" → Some(Some("value")) (set)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial node update for PATCH operations
///
/// Only display fields are editable here. `key`, `kind`, `parent_id` and
/// `sort_order` change through dedicated tree operations or not at all.
///
/// `description` and `icon` use the double-Option pattern:
///
/// - `None`: leave unchanged
/// - `Some(None)`: clear
/// - `Some(Some(value))`: set
///
/// # Examples
///
/// ```rust
/// # use navtree_core::models::{NodeStatus, NodeUpdate};
/// let update = NodeUpdate {
///     label: Some("Billing".to_string()),
///     status: Some(NodeStatus::Ready),
///     description: Some(None),
///     ..Default::default()
/// };
/// assert!(!update.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_zh: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub icon: Option<Option<String>>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_label_zh(mut self, label_zh: impl Into<String>) -> Self {
        self.label_zh = Some(label_zh.into());
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.label_zh.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.icon.is_none()
    }

    /// Validate the provided fields without touching a node
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(label) = &self.label {
            if label.trim().is_empty() {
                return Err(ValidationError::BlankField("label".to_string()));
            }
        }
        if let Some(label_zh) = &self.label_zh {
            if label_zh.trim().is_empty() {
                return Err(ValidationError::BlankField("labelZh".to_string()));
            }
        }
        Ok(())
    }

    /// Apply the provided fields to `node` and bump `updated_at`
    pub fn apply_to(self, node: &mut Node) {
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(label_zh) = self.label_zh {
            node.label_zh = label_zh;
        }
        if let Some(description) = self.description {
            node.description = description;
        }
        if let Some(status) = self.status {
            node.status = status;
        }
        if let Some(icon) = self.icon {
            node.icon = icon;
        }
        node.touch();
    }
}

/// Result of a cascading delete
///
/// `deleted_ids` lists the target first, followed by its descendants in
/// pre-order. Consumers use it for UI and audit cleanup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module(label: &str) -> Node {
        Node::new(
            NodeKind::Module,
            label.to_lowercase(),
            None,
            label.to_string(),
            format!("{}-zh", label),
            0,
        )
    }

    #[test]
    fn test_new_node_defaults() {
        let node = module("Login");
        assert_eq!(node.status, NodeStatus::Draft);
        assert!(node.description.is_none());
        assert!(node.parent_id.is_none());
        assert!(!node.can_have_children());
        assert!(Uuid::parse_str(&node.id).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_labels() {
        let mut node = module("Login");
        node.label_zh = "   ".to_string();
        assert_eq!(
            node.validate(),
            Err(ValidationError::BlankField("labelZh".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_self_parent() {
        let mut node = module("Login");
        node.parent_id = Some(node.id.clone());
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidParent(_))
        ));
    }

    #[test]
    fn test_serialization_uses_camel_case_and_null_parent() {
        let node = module("Login");
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["kind"], "module");
        assert_eq!(value["status"], "draft");
        assert_eq!(value["labelZh"], "Login-zh");
        assert!(value["parentId"].is_null());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_root_sentinel_deserializes_to_none() {
        let mut value = serde_json::to_value(module("Login")).unwrap();
        value["parentId"] = json!("root");

        let node: Node = serde_json::from_value(value).unwrap();
        assert_eq!(node.parent_id, None);
    }

    #[test]
    fn test_update_double_option_semantics() {
        let absent: NodeUpdate = serde_json::from_value(json!({"label": "X"})).unwrap();
        assert_eq!(absent.description, None);

        let cleared: NodeUpdate = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: NodeUpdate = serde_json::from_value(json!({"icon": "folder-open"})).unwrap();
        assert_eq!(set.icon, Some(Some("folder-open".to_string())));
    }

    #[test]
    fn test_update_apply_leaves_structure_alone() {
        let mut node = module("Login");
        node.description = Some("old".to_string());
        let before = node.clone();

        NodeUpdate::new()
            .with_label("Sign in")
            .with_status(NodeStatus::Ready)
            .apply_to(&mut node);

        assert_eq!(node.label, "Sign in");
        assert_eq!(node.status, NodeStatus::Ready);
        assert_eq!(node.description.as_deref(), Some("old"));
        assert_eq!(node.key, before.key);
        assert_eq!(node.parent_id, before.parent_id);
        assert_eq!(node.sort_order, before.sort_order);
        assert!(node.updated_at >= before.updated_at);
    }

    #[test]
    fn test_update_validate_blank_label() {
        let update = NodeUpdate::new().with_label(" ");
        assert!(update.validate().is_err());
        assert!(NodeUpdate::new().is_empty());
    }
}
