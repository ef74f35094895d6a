//! In-process node store
//!
//! Keeps records in a `HashMap` behind a `tokio::sync::RwLock`. Readers share
//! the lock and only ever observe fully committed batches.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::{NodeStore, StoreError, WriteBatch};
use crate::models::Node;

#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<String, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: RwLock::new(nodes.into_iter().map(|n| (n.id.clone(), n)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

/// Apply a batch to a record map. Deletes run before puts.
pub(crate) fn apply_batch(nodes: &mut HashMap<String, Node>, batch: WriteBatch) {
    for id in batch.deletes {
        nodes.remove(&id);
    }
    for node in batch.puts {
        nodes.insert(node.id.clone(), node);
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.read().await.get(id).cloned())
    }

    async fn get_all_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.read().await.values().cloned().collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut nodes = self.nodes.write().await;
        apply_batch(&mut nodes, batch);
        Ok(())
    }
}
