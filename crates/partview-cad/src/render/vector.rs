//! 2D drawing rasterization.

use nalgebra::Point2;

use super::{Canvas, DRAWING_BACKGROUND, DRAWING_INK, fit_scale, margin, stroke_width};
use crate::error::BackendError;
use crate::formats::dxf::Drawing;
use crate::models::{BoundingBox, RenderOutput, Resolution};

/// Rasterize a drawing centred in `target` with a uniform scale.
///
/// A drawing without entities yields an empty canvas and no bounding box.
pub fn render_drawing(drawing: &Drawing, target: Resolution) -> Result<RenderOutput, BackendError> {
    let paths = drawing.tessellate();
    render_paths(&paths, target)
}

/// Rasterize pre-tessellated polylines.
pub fn render_paths(paths: &[Vec<Point2<f64>>], target: Resolution) -> Result<RenderOutput, BackendError> {
    let mut canvas = Canvas::new(target, DRAWING_BACKGROUND);

    let Some((min, max)) = bounds(paths) else {
        return Ok(RenderOutput {
            png: canvas.into_png()?,
            width: target.width,
            height: target.height,
            bounding_box: None,
        });
    };

    let extent = (max.x - min.x, max.y - min.y);
    if !(extent.0.is_finite() && extent.1.is_finite()) {
        return Err(BackendError::DegenerateProjection);
    }
    let m = margin(target.width, target.height);
    let available = (
        (f64::from(target.width) - 2.0 * m).max(1.0),
        (f64::from(target.height) - 2.0 * m).max(1.0),
    );
    let scale = fit_scale(extent, available).unwrap_or(1.0);

    let cx = f64::from(target.width) / 2.0;
    let cy = f64::from(target.height) / 2.0;
    let mid = Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
    // drawing Y grows upwards, raster Y downwards
    let to_pixel = |p: &Point2<f64>| (cx + (p.x - mid.x) * scale, cy - (p.y - mid.y) * scale);

    let stroke = stroke_width(target.width, target.height);
    for path in paths {
        let pixels: Vec<(f64, f64)> = path.iter().map(to_pixel).collect();
        canvas.polyline(&pixels, stroke, DRAWING_INK);
    }

    Ok(RenderOutput {
        png: canvas.into_png()?,
        width: target.width,
        height: target.height,
        bounding_box: Some(BoundingBox {
            width: extent.0,
            height: extent.1,
            depth: 0.0,
        }),
    })
}

/// Lower-left and upper-right corners of every finite point.
pub(crate) fn bounds(paths: &[Vec<Point2<f64>>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let mut iter = paths
        .iter()
        .flatten()
        .filter(|p| p.x.is_finite() && p.y.is_finite());
    let first = *iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), p| {
        (
            Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    }))
}
