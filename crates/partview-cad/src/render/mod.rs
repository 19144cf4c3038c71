//! Rasterization of parsed geometry.

pub mod canvas;
pub mod placeholder;
pub mod solid;
pub mod vector;

use image::Rgba;

pub use canvas::Canvas;

/// Neutral background for drawings.
pub const DRAWING_BACKGROUND: Rgba<u8> = Rgba([245, 245, 245, 255]);
/// Stroke colour for drawings.
pub const DRAWING_INK: Rgba<u8> = Rgba([30, 30, 30, 255]);
/// Background for solid renders.
pub const SOLID_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Base material colour for solid renders (light steel blue).
pub const SOLID_MATERIAL: [f64; 3] = [176.0, 196.0, 222.0];

/// Margin in pixels kept free around the content.
pub fn margin(width: u32, height: u32) -> f64 {
    f64::from(20.min(width.min(height) / 10))
}

/// Stroke width in pixels.
pub fn stroke_width(width: u32, height: u32) -> u32 {
    (width.min(height) / 500).max(1)
}

/// Uniform scale that fits `extent` into `available`, ignoring axes with
/// zero extent. `None` when both extents are zero.
pub fn fit_scale(extent: (f64, f64), available: (f64, f64)) -> Option<f64> {
    let sx = (extent.0 > f64::EPSILON).then(|| available.0 / extent.0);
    let sy = (extent.1 > f64::EPSILON).then(|| available.1 / extent.1);
    match (sx, sy) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}
