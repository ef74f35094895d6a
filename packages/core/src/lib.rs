//! NavTree Core
//!
//! Navigation tree engine for a product-specification workspace: folders and
//! modules arranged in a hierarchy, with every structural change going
//! through one atomic, invariant-checked mutation engine.
//!
//! # Architecture
//!
//! - **Arena model**: nodes are flat records keyed by id; nesting is derived
//!   only at read time by the projector
//! - **Single writer**: `TreeService` serializes mutations, validates the
//!   candidate state and commits one `WriteBatch` per operation
//! - **Pluggable storage**: anything implementing `NodeStore` (in-memory and
//!   JSON file stores ship with the crate)
//!
//! # Modules
//!
//! - [`models`] - Node records, snapshots and the nested read model
//! - [`db`] - Storage trait, stores, sibling ordering and change events
//! - [`services`] - Mutation engine, invariant checker, projector, audit
//! - [`operations`] - Request parameters and the drop-zone resolver
//! - [`config`] - Engine configuration
//! - [`utils`] - Key slugs

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::TreeConfig;
pub use models::*;
pub use operations::*;
pub use services::*;
