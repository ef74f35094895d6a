//! NodeStore Trait - Persistence Abstraction
//!
//! The tree engine talks to storage only through this trait. Implementations
//! provide primitive reads and one atomic write primitive, `commit`, which
//! applies a whole `WriteBatch` or nothing.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async so embedded and remote backends
//!    fit the same seam
//! 2. **Batch commit**: every tree mutation becomes exactly one `commit`
//! 3. **Snapshot reads**: `get_all_nodes` must return a committed state, never
//!    a half-applied batch
//!
//! # Examples
//!
//! ```rust
//! use navtree_core::db::{MemoryStore, NodeStore, WriteBatch};
//! use navtree_core::models::{Node, NodeKind};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let node = Node::new(
//!     NodeKind::Folder,
//!     "specs".to_string(),
//!     None,
//!     "Specs".to_string(),
//!     "规格".to_string(),
//!     0,
//! );
//! let id = node.id.clone();
//! store.commit(WriteBatch::new().put(node)).await.unwrap();
//! assert!(store.get_node(&id).await.unwrap().is_some());
//! # });
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::db::StoreError;
use crate::models::Node;

/// Set of record writes applied atomically. Deletes are applied before puts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub puts: Vec<Node>,
    pub deletes: Vec<String>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, node: Node) -> Self {
        self.puts.push(node);
        self
    }

    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.deletes.push(id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }

    /// Ids touched by this batch, deletes first
    pub fn affected_ids(&self) -> Vec<String> {
        self.deletes
            .iter()
            .cloned()
            .chain(self.puts.iter().map(|n| n.id.clone()))
            .collect()
    }
}

/// Abstraction layer for node persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine shares one store across
/// every request task.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID. `Ok(None)` when absent.
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError>;

    /// Every node of the latest committed state, in no particular order
    async fn get_all_nodes(&self) -> Result<Vec<Node>, StoreError>;

    /// Apply `batch` atomically: all writes become visible together or none do
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// `commit` bounded by `timeout`
    ///
    /// A `StoreError::Timeout` means the batch was not applied. The default
    /// drops the `commit` future at the deadline, which is only sound when
    /// `commit` has no partially applied state across an await point. Stores
    /// that write in several steps must override this.
    async fn commit_within(&self, batch: WriteBatch, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.commit(batch))
            .await
            .map_err(|_| StoreError::Timeout(timeout))?
    }

    async fn put_node(&self, node: Node) -> Result<(), StoreError> {
        self.commit(WriteBatch::new().put(node)).await
    }

    /// Remove a single record. Returns whether it existed.
    async fn delete_node(&self, id: &str) -> Result<bool, StoreError> {
        let existed = self.get_node(id).await?.is_some();
        if existed {
            self.commit(WriteBatch::new().delete(id)).await?;
        }
        Ok(existed)
    }
}
