//! Utility functions shared across the crate

mod slug;

pub use slug::{slugify, unique_slug, FALLBACK_SLUG};
