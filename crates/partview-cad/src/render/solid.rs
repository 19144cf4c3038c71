//! Isometric rendering of 3D geometry.

use image::Rgba;
use nalgebra::{Point3, Rotation3, Vector3};

use super::{Canvas, SOLID_BACKGROUND, SOLID_MATERIAL, fit_scale, margin, stroke_width};
use crate::error::{BackendError, BackendFailure};
use crate::formats::stl::Mesh;
use crate::models::{BoundingBox, RenderOutput, Resolution};

const WIREFRAME: Rgba<u8> = Rgba([150, 160, 175, 255]);
const POINT_COLOR: Rgba<u8> = Rgba([70, 90, 130, 255]);

/// Camera looking at the model from the (1, 1, 1) direction with Z up.
#[derive(Debug, Clone, Copy)]
pub struct IsometricView {
    rotation: Rotation3<f64>,
}

impl Default for IsometricView {
    fn default() -> Self {
        Self {
            rotation: Rotation3::look_at_rh(&Vector3::new(-1.0, -1.0, -1.0), &Vector3::z()),
        }
    }
}

impl IsometricView {
    /// Camera-space position; larger `z` is closer to the viewer.
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation * p
    }
}

/// Axis-aligned extents of `points`.
pub fn bounding_box<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut iter = points.into_iter();
    let first = *iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
}

fn to_bbox(lo: &Point3<f64>, hi: &Point3<f64>) -> BoundingBox {
    BoundingBox {
        width: hi.x - lo.x,
        height: hi.y - lo.y,
        depth: hi.z - lo.z,
    }
}

/// Maps camera-space points to pixels.
#[derive(Debug, Clone, Copy)]
struct Frame {
    scale: f64,
    center: (f64, f64),
    mid: (f64, f64),
}

impl Frame {
    fn fit<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>, target: Resolution) -> Option<Self> {
        let (lo, hi) = bounding_box(points)?;
        let m = margin(target.width, target.height);
        let available = (
            (f64::from(target.width) - 2.0 * m).max(1.0),
            (f64::from(target.height) - 2.0 * m).max(1.0),
        );
        let scale = fit_scale((hi.x - lo.x, hi.y - lo.y), available)?;
        Some(Self {
            scale,
            center: (f64::from(target.width) / 2.0, f64::from(target.height) / 2.0),
            mid: ((lo.x + hi.x) / 2.0, (lo.y + hi.y) / 2.0),
        })
    }

    fn to_pixel(&self, p: &Point3<f64>) -> (f64, f64) {
        (
            self.center.0 + (p.x - self.mid.0) * self.scale,
            self.center.1 - (p.y - self.mid.1) * self.scale,
        )
    }
}

/// Shade and rasterize a triangle mesh.
pub fn render_mesh(mesh: &Mesh, target: Resolution) -> Result<RenderOutput, BackendFailure> {
    let (lo, hi) = bounding_box(mesh.vertices()).ok_or(BackendError::NoGeometry { format: "mesh" })?;
    let bbox = to_bbox(&lo, &hi);

    let view = IsometricView::default();
    let projected: Vec<[Point3<f64>; 3]> = mesh
        .triangles
        .iter()
        .map(|t| [view.project(&t[0]), view.project(&t[1]), view.project(&t[2])])
        .collect();

    let frame = Frame::fit(projected.iter().flatten(), target)
        .ok_or_else(|| BackendFailure::salvaged(BackendError::DegenerateProjection, bbox))?;

    let mut canvas = Canvas::new(target, SOLID_BACKGROUND);
    let mut drawn = false;
    for [a, b, c] in &projected {
        let normal = (b - a).cross(&(c - a));
        let length = normal.norm();
        if length < 1e-12 {
            continue;
        }
        let shade = 0.25 + 0.75 * (normal.z / length).abs();
        let color = Rgba([
            (SOLID_MATERIAL[0] * shade).round() as u8,
            (SOLID_MATERIAL[1] * shade).round() as u8,
            (SOLID_MATERIAL[2] * shade).round() as u8,
            255,
        ]);
        let vertex = |p: &Point3<f64>| {
            let (x, y) = frame.to_pixel(p);
            (x, y, p.z as f32)
        };
        drawn |= canvas.triangle([vertex(a), vertex(b), vertex(c)], color);
    }

    if !drawn {
        return Err(BackendFailure::salvaged(BackendError::DegenerateProjection, bbox));
    }

    Ok(RenderOutput {
        png: canvas
            .into_png()
            .map_err(|e| BackendFailure::salvaged(e, bbox))?,
        width: target.width,
        height: target.height,
        bounding_box: Some(bbox),
    })
}

/// Draw a point cloud inside the wireframe of its bounding box.
pub fn render_points(points: &[Point3<f64>], target: Resolution) -> Result<RenderOutput, BackendFailure> {
    let (lo, hi) = bounding_box(points).ok_or(BackendError::NoGeometry { format: "points" })?;
    let bbox = to_bbox(&lo, &hi);

    let view = IsometricView::default();
    let corners: Vec<Point3<f64>> = (0..8)
        .map(|i| {
            Point3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        })
        .map(|p| view.project(&p))
        .collect();

    let frame = Frame::fit(&corners, target)
        .ok_or_else(|| BackendFailure::salvaged(BackendError::DegenerateProjection, bbox))?;

    let mut canvas = Canvas::new(target, SOLID_BACKGROUND);
    let stroke = stroke_width(target.width, target.height);
    for i in 0..8usize {
        for axis in [1usize, 2, 4] {
            let j = i | axis;
            if j != i {
                canvas.line(frame.to_pixel(&corners[i]), frame.to_pixel(&corners[j]), stroke, WIREFRAME);
            }
        }
    }
    for p in points {
        let (x, y) = frame.to_pixel(&view.project(p));
        canvas.stamp(x.round() as i64, y.round() as i64, stroke * 3, POINT_COLOR);
    }

    Ok(RenderOutput {
        png: canvas
            .into_png()
            .map_err(|e| BackendFailure::salvaged(e, bbox))?,
        width: target.width,
        height: target.height,
        bounding_box: Some(bbox),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::stl::{self, fixtures};
    use crate::render::canvas::content_extents;

    #[test]
    fn test_isometric_view_faces_viewer() {
        let view = IsometricView::default();
        let toward = view.project(&Point3::new(1.0, 1.0, 1.0));
        assert!(toward.z > 0.0);
        assert!(toward.x.abs() < 1e-9 && toward.y.abs() < 1e-9);
        // world Z projects upwards on screen
        let up = view.project(&Point3::new(0.0, 0.0, 1.0));
        assert!(up.y > 0.0);
    }

    #[test]
    fn test_box_mesh_renders_with_bbox() {
        let mesh = stl::parse(&fixtures::binary_box([30.0, 20.0, 10.0])).expect("parse");
        let output = render_mesh(&mesh, Resolution::new(400, 300)).expect("render");
        let bbox = output.bounding_box.expect("bbox");
        assert!((bbox.width - 30.0).abs() < 1e-6);
        assert!((bbox.height - 20.0).abs() < 1e-6);
        assert!((bbox.depth - 10.0).abs() < 1e-6);

        let image = image::load_from_memory(&output.png).expect("decode").to_rgba8();
        let (x0, y0, x1, y1) = content_extents(&image, SOLID_BACKGROUND).expect("content");
        assert!(x0 >= 19 && y0 >= 19 && x1 <= 381 && y1 <= 281);
    }

    #[test]
    fn test_zero_area_mesh_is_degenerate() {
        // every triangle lies on a line
        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = Mesh {
            triangles: vec![line],
        };
        let failure = render_mesh(&mesh, Resolution::new(100, 100)).expect_err("degenerate");
        assert!(matches!(failure.error, BackendError::DegenerateProjection));
        let bbox = failure.salvaged_bbox.expect("salvaged");
        assert!((bbox.width - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_render() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(40.0, 20.0, 10.0)];
        let output = render_points(&points, Resolution::new(200, 200)).expect("render");
        assert!(output.bounding_box.is_some());

        let single = vec![Point3::new(1.0, 1.0, 1.0)];
        let failure = render_points(&single, Resolution::new(200, 200)).expect_err("degenerate");
        assert!(failure.salvaged_bbox.is_some());
    }
}
