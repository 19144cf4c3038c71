//! Asset synchronization configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the asset sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// Width in pixels of the intermediate CAD render.
    #[serde(default = "default_render_width")]
    #[validate(range(min = 64, max = 7680))]
    pub render_width: u32,
    /// Height in pixels of the intermediate CAD render.
    #[serde(default = "default_render_height")]
    #[validate(range(min = 64, max = 4320))]
    pub render_height: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            render_width: default_render_width(),
            render_height: default_render_height(),
        }
    }
}

fn default_render_width() -> u32 {
    1920
}

fn default_render_height() -> u32 {
    1080
}
