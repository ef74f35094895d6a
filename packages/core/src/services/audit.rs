//! Audit trail for tree mutations
//!
//! After every committed mutation the engine hands one [`AuditRecord`] to an
//! [`AuditSink`]. Recording is fire-and-forget: a failing sink is logged and
//! never rolls back or fails the mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Who performed a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Engine-internal work such as seeding an empty tree
    pub fn system() -> Self {
        Self::new("system", "System")
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "Anonymous")
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeOperation {
    AddNode,
    UpdateNode,
    DeleteNode,
    MoveNode,
    ReorderNodes,
}

impl TreeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeOperation::AddNode => "add_node",
            TreeOperation::UpdateNode => "update_node",
            TreeOperation::DeleteNode => "delete_node",
            TreeOperation::MoveNode => "move_node",
            TreeOperation::ReorderNodes => "reorder_nodes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub actor_id: String,
    pub actor_name: String,
    pub operation: TreeOperation,
    pub affected_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor: &Actor, operation: TreeOperation, affected_ids: Vec<String>) -> Self {
        Self {
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            operation,
            affected_ids,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit sink closed")]
    Closed,

    #[error("Audit write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// Writes each record as a structured log line on the `navtree::audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        tracing::info!(
            target: "navtree::audit",
            actor_id = %record.actor_id,
            actor_name = %record.actor_name,
            operation = record.operation.as_str(),
            affected = record.affected_ids.len(),
            ids = ?record.affected_ids,
            "tree mutation"
        );
        Ok(())
    }
}

/// Forwards records to an in-process receiver (tests, push layers)
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl ChannelAuditSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.tx.send(record).map_err(|_| AuditError::Closed)
    }
}
