//! Tree Services
//!
//! - `TreeService` - the mutation engine and read entry point
//! - `TreeInvariantChecker` - pure structural checks over a snapshot
//! - `TreeProjector` - nested read model from flat records
//! - `audit` - actor identity and the audit sink seam
//!
//! Services coordinate between the storage layer and callers; nothing else
//! writes to a `NodeStore`.

pub mod audit;
pub mod error;
pub mod invariant_checker;
pub mod tree_projector;
pub mod tree_service;

pub use audit::{
    Actor, AuditError, AuditRecord, AuditSink, ChannelAuditSink, TracingAuditSink, TreeOperation,
};
pub use error::TreeError;
pub use invariant_checker::{Invariant, InvariantViolation, TreeInvariantChecker};
pub use tree_projector::TreeProjector;
pub use tree_service::TreeService;
