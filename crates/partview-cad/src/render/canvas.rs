//! A small software rasterizer over an RGBA image buffer.

use std::io::Cursor;

use bytes::Bytes;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::BackendError;
use crate::models::Resolution;

/// Glyph cell edge in font units.
pub const GLYPH_SIZE: u32 = 8;

/// Drawing surface with an optional depth buffer.
#[derive(Debug)]
pub struct Canvas {
    image: RgbaImage,
    depth: Vec<f32>,
    background: Rgba<u8>,
}

impl Canvas {
    /// A canvas filled with `background`.
    pub fn new(size: Resolution, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, background),
            depth: Vec::new(),
            background,
        }
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Set one pixel; out-of-bounds coordinates are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height()) {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, color);
    }

    /// Fill a `size`×`size` square centred on `(x, y)`.
    pub fn stamp(&mut self, x: i64, y: i64, size: u32, color: Rgba<u8>) {
        let size = i64::from(size.max(1));
        let offset = (size - 1) / 2;
        for dy in 0..size {
            for dx in 0..size {
                self.put(x - offset + dx, y - offset + dy, color);
            }
        }
    }

    /// Draw a straight segment with a square brush.
    ///
    /// The segment is clipped to the canvas grown by the brush width.
    /// Segments with a non-finite endpoint are not drawn.
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: u32, color: Rgba<u8>) {
        let pad = f64::from(width.max(1)) + 1.0;
        let lo = (-pad, -pad);
        let hi = (f64::from(self.width()) + pad, f64::from(self.height()) + pad);
        let Some((from, to)) = clip_segment(from, to, lo, hi) else {
            return;
        };
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, width, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Draw connected segments.
    pub fn polyline(&mut self, points: &[(f64, f64)], width: u32, color: Rgba<u8>) {
        match points {
            [] => {}
            [single] => {
                if single.0.is_finite() && single.1.is_finite() {
                    let x = single.0.clamp(-1.0, f64::from(self.width())).round() as i64;
                    let y = single.1.clamp(-1.0, f64::from(self.height())).round() as i64;
                    self.stamp(x, y, width, color);
                }
            }
            _ => {
                for pair in points.windows(2) {
                    self.line(pair[0], pair[1], width, color);
                }
            }
        }
    }

    /// Fill a triangle with depth testing. Larger `z` is closer to the
    /// viewer. Returns whether any pixel was written.
    pub fn triangle(&mut self, vertices: [(f64, f64, f32); 3], color: Rgba<u8>) -> bool {
        if self.depth.is_empty() {
            self.depth = vec![f32::NEG_INFINITY; (self.width() * self.height()) as usize];
        }

        let [a, b, c] = vertices;
        let area = edge((a.0, a.1), (b.0, b.1), (c.0, c.1));
        if area.abs() < 1e-12 {
            return false;
        }

        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as u32;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as u32;
        let max_x = (a.0.max(b.0).max(c.0).ceil() as i64).min(i64::from(self.width()) - 1);
        let max_y = (a.1.max(b.1).max(c.1).ceil() as i64).min(i64::from(self.height()) - 1);
        if max_x < 0 || max_y < 0 {
            return false;
        }

        let mut wrote = false;
        for py in min_y..=max_y as u32 {
            for px in min_x..=max_x as u32 {
                let p = (f64::from(px) + 0.5, f64::from(py) + 0.5);
                let w0 = edge((b.0, b.1), (c.0, c.1), p) / area;
                let w1 = edge((c.0, c.1), (a.0, a.1), p) / area;
                let w2 = edge((a.0, a.1), (b.0, b.1), p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = (w0 as f32) * a.2 + (w1 as f32) * b.2 + (w2 as f32) * c.2;
                let idx = (py * self.width() + px) as usize;
                if z > self.depth[idx] {
                    self.depth[idx] = z;
                    self.image.put_pixel(px, py, color);
                    wrote = true;
                }
            }
        }
        wrote
    }

    /// Pixel width of `text` at `scale`.
    pub fn text_width(text: &str, scale: u32) -> u32 {
        text.chars().count() as u32 * GLYPH_SIZE * scale
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgba<u8>) {
        let scale = i64::from(scale.max(1));
        let cell = i64::from(GLYPH_SIZE) * scale;
        for (i, ch) in text.chars().enumerate() {
            let glyph = BASIC_FONTS
                .get(ch)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            let origin_x = x + i as i64 * cell;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE as i64 {
                    if (*bits >> col) & 1 == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.put(
                                origin_x + col * scale + sx,
                                y + row as i64 * scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }

    /// Outline a rectangle.
    pub fn rect_outline(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: u32, color: Rgba<u8>) {
        self.polyline(
            &[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)],
            width,
            color,
        );
    }

    /// Bounding rectangle `(min_x, min_y, max_x, max_y)` of every pixel that
    /// differs from the background.
    pub fn content_extents(&self) -> Option<(u32, u32, u32, u32)> {
        content_extents(&self.image, self.background)
    }

    /// Encode as PNG.
    pub fn into_png(self) -> Result<Bytes, BackendError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(Bytes::from(buf))
    }
}

/// Bounding rectangle of all pixels that differ from `background`.
pub fn content_extents(image: &RgbaImage, background: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
    let mut extents: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if *pixel == background {
            continue;
        }
        extents = Some(match extents {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    extents
}

/// Liang-Barsky clip of `from -> to` against the box `lo..hi`.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    lo: (f64, f64),
    hi: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if ![from.0, from.1, to.0, to.1, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, from.0 - lo.0),
        (dx, hi.0 - from.0),
        (-dy, from.1 - lo.1),
        (dy, hi.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

fn edge(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}
