//! Informative placeholder images.
//!
//! Always succeeds: if PNG encoding of the requested size fails, a
//! minimal 1×1 image is returned instead.

use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use partview_core::types::SourceFile;

use super::Canvas;
use super::canvas::GLYPH_SIZE;
use crate::models::{BoundingBox, Resolution};

const BACKGROUND: Rgba<u8> = Rgba([43, 43, 43, 255]);
const FRAME: Rgba<u8> = Rgba([90, 90, 90, 255]);
const TITLE: Rgba<u8> = Rgba([230, 230, 230, 255]);
const DETAIL: Rgba<u8> = Rgba([170, 170, 170, 255]);

/// A generated placeholder.
#[derive(Debug, Clone)]
pub struct Placeholder {
    /// PNG bytes.
    pub png: Bytes,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// The text lines drawn into the image.
    pub caption: Vec<String>,
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {} ({bytes} bytes)", UNITS[unit])
    }
}

/// Text shown on the placeholder for `file`.
pub fn caption_for(file: &SourceFile, salvaged: Option<&BoundingBox>) -> Vec<String> {
    let label = if file.extension.is_empty() {
        "Unknown file".to_string()
    } else {
        format!("{} file", file.extension.to_ascii_uppercase())
    };
    let mut lines = vec![
        label,
        file.filename.clone(),
        format!("Size: {}", format_size(file.size_bytes)),
    ];
    if let Some(bbox) = salvaged {
        lines.push(format!("Extents: {}", bbox.describe()));
    }
    lines.push("Preview unavailable".to_string());
    lines
}

/// Generate a placeholder for `file` at `target`.
pub fn generate(file: &SourceFile, target: Resolution, salvaged: Option<&BoundingBox>) -> Placeholder {
    let caption = caption_for(file, salvaged);
    let mut canvas = Canvas::new(target, BACKGROUND);

    let inset = f64::from((target.min_side() / 40).max(1));
    canvas.rect_outline(
        inset,
        inset,
        f64::from(target.width) - 1.0 - inset,
        f64::from(target.height) - 1.0 - inset,
        (target.min_side() / 300).max(1),
        FRAME,
    );

    let base_scale = (target.min_side() / 150).max(1);
    let scales: Vec<u32> = caption
        .iter()
        .map(|line| fit_text_scale(line, base_scale, target.width))
        .collect();
    let line_gap = GLYPH_SIZE * base_scale / 2;
    let block_height: u32 = scales.iter().map(|s| GLYPH_SIZE * s + line_gap).sum();
    let mut y = i64::from(target.height.saturating_sub(block_height) / 2);

    for (i, (line, scale)) in caption.iter().zip(&scales).enumerate() {
        let width = Canvas::text_width(line, *scale);
        let x = i64::from(target.width.saturating_sub(width) / 2);
        let color = if i == 0 { TITLE } else { DETAIL };
        canvas.text(x, y, line, *scale, color);
        y += i64::from(GLYPH_SIZE * scale + line_gap);
    }

    let png = canvas.into_png().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Placeholder encoding failed, using minimal image");
        minimal_png()
    });
    let (width, height) = if png.is_empty() {
        (0, 0)
    } else {
        (target.width, target.height)
    };

    Placeholder {
        png,
        width,
        height,
        caption,
    }
}

/// Largest scale ≤ `base` at which `line` fits in 90% of `width`.
fn fit_text_scale(line: &str, base: u32, width: u32) -> u32 {
    let chars = line.chars().count().max(1) as u32;
    let fit = (width * 9 / 10) / (chars * GLYPH_SIZE);
    fit.clamp(1, base)
}

fn minimal_png() -> Bytes {
    let mut buf = Vec::new();
    let image = RgbaImage::from_pixel(1, 1, BACKGROUND);
    match image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png) {
        Ok(()) => Bytes::from(buf),
        Err(_) => Bytes::new(),
    }
}
