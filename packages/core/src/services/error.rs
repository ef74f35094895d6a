//! Service Layer Error Types
//!
//! `TreeError` is the single failure type of every tree operation. Each
//! variant names the structural rule that was violated so callers can show it
//! to the user verbatim. None of them are retried automatically.

use crate::db::StoreError;
use crate::models::ValidationError;
use crate::services::invariant_checker::InvariantViolation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced node does not exist
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// Destination cannot hold children, or does not exist
    #[error("Invalid parent {parent_id}: {reason}")]
    InvalidParent { parent_id: String, reason: String },

    /// The mutation would make a node its own ancestor
    #[error("Cycle detected: {0}")]
    CycleDetected(String),

    /// Slug collision that could not be resolved
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Two siblings would share a sort order. Indicates an engine bug.
    #[error("Sibling order conflict: {0}")]
    OrderConflict(String),

    /// Request is well-formed but does not match the current tree
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence failure or timeout; nothing was written
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Engine was constructed with an invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl TreeError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_parent(parent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Only store failures may be retried unchanged; no partial state is left
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Machine-readable error code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NODE_NOT_FOUND",
            Self::InvalidParent { .. } => "INVALID_PARENT",
            Self::CycleDetected(_) => "CYCLE_DETECTED",
            Self::DuplicateKey(_) => "DUPLICATE_KEY",
            Self::OrderConflict(_) => "ORDER_CONFLICT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<InvariantViolation> for TreeError {
    fn from(violation: InvariantViolation) -> Self {
        let message = violation.to_string();
        match violation {
            InvariantViolation::CycleDetected { .. } => Self::CycleDetected(message),
            InvariantViolation::InvalidParent { parent_id, reason } => {
                Self::InvalidParent { parent_id, reason }
            }
            InvariantViolation::DuplicateKey { .. } => Self::DuplicateKey(message),
            InvariantViolation::OrderConflict { .. } => Self::OrderConflict(message),
        }
    }
}
