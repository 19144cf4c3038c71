//! Preview cache configuration.

use serde::{Deserialize, Serialize};

/// Sizing for the display-side thumbnail cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewCacheConfig {
    /// Maximum total weight of cached images, in bytes.
    #[serde(default = "default_max_capacity_bytes")]
    pub max_capacity_bytes: u64,
    /// Time-to-live for a cached image in seconds.
    #[serde(default = "default_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for PreviewCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity_bytes: default_max_capacity_bytes(),
            time_to_live_seconds: default_ttl(),
        }
    }
}

fn default_max_capacity_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_ttl() -> u64 {
    600
}
