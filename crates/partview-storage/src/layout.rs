//! Object paths used by every provider.
//!
//! ```text
//! thumbnails/{part}/{generation}/{small|medium|large}.png
//! sources/{part}/{2d|3d|user}/{generation}-{filename}
//! ```
//!
//! A new generation id is used for every write, so an object path is
//! never overwritten in place.

use partview_core::types::{GenerationId, PartId, SourceSlot, ThumbnailTier};

/// Prefix holding every thumbnail generation of a part.
pub fn thumbnail_prefix(part_id: PartId) -> String {
    format!("thumbnails/{part_id}/")
}

/// Path of one thumbnail tier.
pub fn thumbnail_path(part_id: PartId, generation: GenerationId, tier: ThumbnailTier) -> String {
    format!(
        "{}{}/{}.png",
        thumbnail_prefix(part_id),
        generation.short(),
        tier.as_str()
    )
}

/// Prefix holding every stored source of a part.
pub fn source_prefix(part_id: PartId) -> String {
    format!("sources/{part_id}/")
}

/// Path of an uploaded source file.
pub fn source_path(part_id: PartId, slot: SourceSlot, generation: GenerationId, filename: &str) -> String {
    format!(
        "{}{}/{}-{}",
        source_prefix(part_id),
        slot.path_segment(),
        generation.short(),
        safe_filename(filename)
    )
}

/// Strip path separators and control characters from a file name.
pub fn safe_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "file".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_part_prefix() {
        let part = PartId::new();
        let generation = GenerationId::next();

        let small = thumbnail_path(part, generation, ThumbnailTier::Small);
        assert!(small.starts_with(&thumbnail_prefix(part)));
        assert!(small.ends_with(&format!("{}/small.png", generation.short())));

        let source = source_path(part, SourceSlot::Drawing2D, generation, "floor/plan.dxf");
        assert!(source.starts_with(&format!("sources/{part}/2d/")));
        assert!(source.ends_with("-floor_plan.dxf"));
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("..\\evil.dwg"), ".._evil.dwg");
        assert_eq!(safe_filename(".."), "file");
        assert_eq!(safe_filename(" photo.png "), "photo.png");
    }
}
