//! Configuration for the tree engine
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::operations::DropZoneConfig;

/// Upper bound for the store timeout; anything longer is almost certainly a typo
const MAX_STORE_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Deadline for each individual store call (read or commit)
    pub store_timeout_ms: u64,

    /// Capacity of the tree event broadcast channel
    pub event_channel_capacity: usize,

    /// Labels of the folder seeded into an empty tree
    pub placeholder_label: String,
    pub placeholder_label_zh: String,

    pub drop_zone: DropZoneConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            event_channel_capacity: 128,
            placeholder_label: "Untitled".to_string(),
            placeholder_label_zh: "未命名".to_string(),
            drop_zone: DropZoneConfig::default(),
        }
    }
}

impl TreeConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store_timeout_ms == 0 {
            return Err("store_timeout_ms must be greater than 0".to_string());
        }

        if self.store_timeout_ms > MAX_STORE_TIMEOUT_MS {
            return Err(format!(
                "store_timeout_ms cannot exceed {}",
                MAX_STORE_TIMEOUT_MS
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        if self.placeholder_label.trim().is_empty() || self.placeholder_label_zh.trim().is_empty() {
            return Err("placeholder labels cannot be empty".to_string());
        }

        self.drop_zone.validate()
    }
}
