//! Storage Layer
//!
//! The tree engine persists flat node records through the [`NodeStore`]
//! trait. Two backends ship with the crate:
//!
//! - [`MemoryStore`] - in-process map, used by tests and ephemeral servers
//! - [`FileStore`] - durable JSON snapshot with atomic write-then-rename commits
//!
//! Both guarantee that readers only see committed batches.

mod error;
pub mod events;
mod file_store;
mod memory_store;
mod node_store;
pub mod sibling_order;

pub use error::StoreError;
pub use events::{Placement, TreeEvent};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use node_store::{NodeStore, WriteBatch};
pub use sibling_order::SiblingOrderCalculator;
