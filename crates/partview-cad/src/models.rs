//! Render request and result types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Target raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution; zero sides are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// The shorter side.
    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Model extents in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Extent along X.
    pub width: f64,
    /// Extent along Y.
    pub height: f64,
    /// Extent along Z; zero for 2D drawings.
    pub depth: f64,
}

impl BoundingBox {
    /// Human-readable `W x H x D` form.
    pub fn describe(&self) -> String {
        format!(
            "{:.2} x {:.2} x {:.2}",
            self.width, self.height, self.depth
        )
    }
}

/// A successful backend render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// PNG bytes.
    pub png: Bytes,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Extents of what was drawn, absent for an empty drawing.
    pub bounding_box: Option<BoundingBox>,
}

/// A failed attempt by one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendAttempt {
    /// Backend id.
    pub backend: String,
    /// Failure description.
    pub reason: String,
}

/// What [`crate::CadRenderer::render`] returns.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// PNG bytes.
    pub image_bytes: Bytes,
    /// Pixel width.
    pub pixel_width: u32,
    /// Pixel height.
    pub pixel_height: u32,
    /// Model extents; always `None` when `degraded`.
    pub bounding_box: Option<BoundingBox>,
    /// Id of the backend that produced the image, or `"placeholder"`.
    pub backend_used: String,
    /// Whether the image is a placeholder.
    pub degraded: bool,
    /// Text lines drawn into a placeholder; empty otherwise.
    pub caption: Vec<String>,
    /// Backends that were tried and failed, in order.
    pub attempts: Vec<BackendAttempt>,
}
