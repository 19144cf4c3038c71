//! Derive the three thumbnail tiers from one source image.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use partview_core::types::{PartId, ThumbnailTier};

/// One encoded thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    pub tier: ThumbnailTier,
    pub width: u32,
    pub height: u32,
    /// PNG bytes.
    pub png: Bytes,
}

/// Thumbnails of every tier derived from one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSet {
    pub part_id: PartId,
    /// Tag of the source the image came from, e.g. `"2D"`.
    pub generated_from: String,
    pub small: ThumbnailImage,
    pub medium: ThumbnailImage,
    pub large: ThumbnailImage,
}

impl ThumbnailSet {
    pub fn get(&self, tier: ThumbnailTier) -> &ThumbnailImage {
        match tier {
            ThumbnailTier::Small => &self.small,
            ThumbnailTier::Medium => &self.medium,
            ThumbnailTier::Large => &self.large,
        }
    }

    /// Tiers smallest first.
    pub fn iter(&self) -> impl Iterator<Item = &ThumbnailImage> {
        [&self.small, &self.medium, &self.large].into_iter()
    }
}

/// Largest size with the aspect ratio of `(width, height)` that fits in
/// `bounds` without upscaling. Each side is at least one pixel.
pub fn fit_within(width: u32, height: u32, bounds: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = bounds;
    if width <= max_w && height <= max_h {
        return (width.max(1), height.max(1));
    }
    let (w, h) = (u64::from(width), u64::from(height));
    let (bw, bh) = (u64::from(max_w), u64::from(max_h));
    if w * bh >= h * bw {
        let scaled = (h * bw + w / 2) / w;
        (max_w, (scaled as u32).clamp(1, max_h))
    } else {
        let scaled = (w * bh + h / 2) / h;
        ((scaled as u32).clamp(1, max_w), max_h)
    }
}

/// Produces PNG thumbnails with a Lanczos3 filter.
///
/// Pure and synchronous: identical input bytes yield identical output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThumbnailDeriver;

impl ThumbnailDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derive all tiers, or `None` when the bytes are not a usable image.
    pub fn derive(&self, part_id: PartId, image_bytes: &[u8], source_tag: &str) -> Option<ThumbnailSet> {
        if image_bytes.is_empty() {
            warn!(%part_id, source = source_tag, "No preview: image is empty");
            return None;
        }
        let image = match image::load_from_memory(image_bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(%part_id, source = source_tag, error = %e, "No preview: image cannot be decoded");
                return None;
            }
        };

        let mut tiers = Vec::with_capacity(ThumbnailTier::ALL.len());
        for tier in ThumbnailTier::ALL {
            match Self::encode_tier(&image, tier) {
                Ok(thumb) => tiers.push(thumb),
                Err(e) => {
                    warn!(%part_id, tier = tier.as_str(), error = %e, "No preview: thumbnail encoding failed");
                    return None;
                }
            }
        }

        let mut tiers = tiers.into_iter();
        let (small, medium, large) = (tiers.next()?, tiers.next()?, tiers.next()?);
        debug!(
            %part_id,
            source = source_tag,
            native = ?(image.width(), image.height()),
            large = ?(large.width, large.height),
            "Derived thumbnails"
        );
        Some(ThumbnailSet {
            part_id,
            generated_from: source_tag.to_string(),
            small,
            medium,
            large,
        })
    }

    fn encode_tier(image: &DynamicImage, tier: ThumbnailTier) -> Result<ThumbnailImage, image::ImageError> {
        let (width, height) = fit_within(image.width(), image.height(), tier.bounds());
        let rgba = if (width, height) == (image.width(), image.height()) {
            image.to_rgba8()
        } else {
            image
                .resize_exact(width, height, FilterType::Lanczos3)
                .to_rgba8()
        };

        let mut buf = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(ThumbnailImage {
            tier,
            width,
            height,
            png: Bytes::from(buf),
        })
    }
}
