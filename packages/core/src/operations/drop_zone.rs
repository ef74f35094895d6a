//! Drop-zone resolution
//!
//! Maps the pointer's vertical offset inside a candidate row to a discrete
//! structural intent. Pure geometry: no store access, no DOM.
//!
//! ```text
//!  0%  ┌──────────────┐
//!      │   Before     │  top edge band
//! 25%  ├──────────────┤
//!      │   Into       │  Folder targets only; Modules split at 50%
//! 75%  ├──────────────┤
//!      │   After      │  bottom edge band
//! 100% └──────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Node, NodeKind};
use crate::operations::{MoveNodeParams, MovePosition};

/// The resolver's output is exactly the `position` argument of a move.
pub type DropIntent = MovePosition;

const DEFAULT_EDGE_RATIO: f64 = 0.25;

/// Height fraction of each edge band (top and bottom)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropZoneConfig {
    pub edge_ratio: f64,
}

impl Default for DropZoneConfig {
    fn default() -> Self {
        Self {
            edge_ratio: DEFAULT_EDGE_RATIO,
        }
    }
}

impl DropZoneConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.edge_ratio > 0.0 && self.edge_ratio <= 0.5) {
            return Err(format!(
                "drop_zone.edge_ratio must be in (0, 0.5], got {}",
                self.edge_ratio
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DropZoneResolver {
    config: DropZoneConfig,
}

impl DropZoneResolver {
    pub fn new(config: DropZoneConfig) -> Self {
        Self { config }
    }

    /// Resolve a pointer offset within a row of `row_height`
    ///
    /// - `offset < edge * h` → `Before`
    /// - `offset > (1 - edge) * h` → `After`
    /// - otherwise `Into` for folders; modules fall to `Before` below the
    ///   midpoint and `After` from the midpoint down
    ///
    /// Offsets outside the row are clamped. A degenerate row height
    /// (zero, negative, NaN) resolves to `After`.
    ///
    /// # Examples
    /// ```
    /// # use navtree_core::operations::{DropZoneResolver, MovePosition};
    /// # use navtree_core::models::NodeKind;
    /// let resolver = DropZoneResolver::default();
    /// assert_eq!(resolver.resolve(10.0, 100.0, NodeKind::Folder), MovePosition::Before);
    /// assert_eq!(resolver.resolve(50.0, 100.0, NodeKind::Folder), MovePosition::Into);
    /// assert_eq!(resolver.resolve(50.0, 100.0, NodeKind::Module), MovePosition::After);
    /// ```
    pub fn resolve(&self, offset_y: f64, row_height: f64, target_kind: NodeKind) -> DropIntent {
        if !row_height.is_finite() || row_height <= 0.0 {
            return MovePosition::After;
        }

        let offset = if offset_y.is_nan() {
            0.0
        } else {
            offset_y.clamp(0.0, row_height)
        };
        let ratio = offset / row_height;
        let edge = self.config.edge_ratio;

        if ratio < edge {
            MovePosition::Before
        } else if ratio > 1.0 - edge {
            MovePosition::After
        } else {
            match target_kind {
                NodeKind::Folder => MovePosition::Into,
                NodeKind::Module if ratio < 0.5 => MovePosition::Before,
                NodeKind::Module => MovePosition::After,
            }
        }
    }

    /// Build the move for dropping `dragged_id` on `target` with `intent`
    ///
    /// `Into` makes `target` the new parent. `Before`/`After` use `target`
    /// as the anchor and its parent as the destination.
    pub fn to_move(dragged_id: &str, target: &Node, intent: DropIntent) -> MoveNodeParams {
        match intent {
            MovePosition::Into => MoveNodeParams::into_parent(dragged_id, Some(target.id.clone())),
            MovePosition::Before | MovePosition::After => MoveNodeParams {
                node_id: dragged_id.to_string(),
                target_parent_id: target.parent_id.clone(),
                position: intent,
                anchor_sibling_id: Some(target.id.clone()),
            },
        }
    }

    /// `resolve` followed by `to_move`
    pub fn resolve_move(
        &self,
        dragged_id: &str,
        target: &Node,
        offset_y: f64,
        row_height: f64,
    ) -> MoveNodeParams {
        let intent = self.resolve(offset_y, row_height, target.kind);
        Self::to_move(dragged_id, target, intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(kind: NodeKind, parent: Option<&str>) -> Node {
        Node::new(
            kind,
            "target".to_string(),
            parent.map(str::to_string),
            "Target".to_string(),
            "目标".to_string(),
            0,
        )
    }

    #[test]
    fn test_folder_zones() {
        let r = DropZoneResolver::default();
        assert_eq!(r.resolve(10.0, 100.0, NodeKind::Folder), MovePosition::Before);
        assert_eq!(r.resolve(50.0, 100.0, NodeKind::Folder), MovePosition::Into);
        assert_eq!(r.resolve(90.0, 100.0, NodeKind::Folder), MovePosition::After);
    }

    #[test]
    fn test_zone_boundaries_belong_to_middle() {
        let r = DropZoneResolver::default();
        assert_eq!(r.resolve(25.0, 100.0, NodeKind::Folder), MovePosition::Into);
        assert_eq!(r.resolve(75.0, 100.0, NodeKind::Folder), MovePosition::Into);
        assert_eq!(r.resolve(24.9, 100.0, NodeKind::Folder), MovePosition::Before);
        assert_eq!(r.resolve(75.1, 100.0, NodeKind::Folder), MovePosition::After);
    }

    #[test]
    fn test_module_never_yields_into() {
        let r = DropZoneResolver::default();
        for offset in 0..=100 {
            let intent = r.resolve(offset as f64, 100.0, NodeKind::Module);
            assert_ne!(intent, MovePosition::Into, "offset {}", offset);
        }
        assert_eq!(r.resolve(10.0, 100.0, NodeKind::Module), MovePosition::Before);
        assert_eq!(r.resolve(40.0, 100.0, NodeKind::Module), MovePosition::Before);
        assert_eq!(r.resolve(50.0, 100.0, NodeKind::Module), MovePosition::After);
        assert_eq!(r.resolve(90.0, 100.0, NodeKind::Module), MovePosition::After);
    }

    #[test]
    fn test_out_of_range_and_degenerate_input() {
        let r = DropZoneResolver::default();
        assert_eq!(r.resolve(-20.0, 100.0, NodeKind::Folder), MovePosition::Before);
        assert_eq!(r.resolve(500.0, 100.0, NodeKind::Folder), MovePosition::After);
        assert_eq!(r.resolve(f64::NAN, 100.0, NodeKind::Folder), MovePosition::Before);
        assert_eq!(r.resolve(10.0, 0.0, NodeKind::Folder), MovePosition::After);
        assert_eq!(r.resolve(10.0, f64::INFINITY, NodeKind::Folder), MovePosition::After);
    }

    #[test]
    fn test_custom_edge_ratio() {
        let r = DropZoneResolver::new(DropZoneConfig { edge_ratio: 0.1 });
        assert_eq!(r.resolve(15.0, 100.0, NodeKind::Folder), MovePosition::Into);
        assert!(DropZoneConfig { edge_ratio: 0.6 }.validate().is_err());
        assert!(DropZoneConfig { edge_ratio: 0.0 }.validate().is_err());
        assert!(DropZoneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_to_move_into_folder() {
        let folder = target(NodeKind::Folder, Some("parent"));
        let params = DropZoneResolver::to_move("dragged", &folder, MovePosition::Into);
        assert_eq!(params.target_parent_id.as_deref(), Some(folder.id.as_str()));
        assert_eq!(params.anchor_sibling_id, None);
    }

    #[test]
    fn test_resolve_move_beside_module() {
        let module = target(NodeKind::Module, Some("parent"));
        let params = DropZoneResolver::default().resolve_move("dragged", &module, 80.0, 100.0);
        assert_eq!(params.position, MovePosition::After);
        assert_eq!(params.target_parent_id.as_deref(), Some("parent"));
        assert_eq!(params.anchor_sibling_id.as_deref(), Some(module.id.as_str()));
    }
}
