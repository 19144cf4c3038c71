//! The persisted asset record of a part.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::PartId;
use super::source::SourceSlot;

/// The three thumbnail resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailTier {
    /// Fits 100×100.
    Small,
    /// Fits 800×800.
    Medium,
    /// Fits 3840×2160.
    Large,
}

impl ThumbnailTier {
    /// All tiers, smallest first.
    pub const ALL: [ThumbnailTier; 3] = [Self::Small, Self::Medium, Self::Large];

    /// The bounding box `(width, height)` a thumbnail of this tier fits in.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            Self::Small => (100, 100),
            Self::Medium => (800, 800),
            Self::Large => (3840, 2160),
        }
    }

    /// Name used in object paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Metadata about a stored source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFileMeta {
    /// Original file name.
    pub filename: String,
    /// Lower-case extension.
    pub extension: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type.
    pub content_type: String,
    /// Path of the object in the blob store.
    pub storage_path: String,
    /// Public URL of the object.
    pub url: String,
}

/// One stored thumbnail image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailObject {
    /// Path of the object in the blob store.
    pub storage_path: String,
    /// Public URL of the object.
    pub url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// The live thumbnail set referenced by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRefs {
    /// Generation the objects were written under.
    pub generation: String,
    /// Slot the thumbnails were derived from.
    pub generated_from: SourceSlot,
    /// Whether the source image was a placeholder.
    pub degraded: bool,
    /// ≤100×100 thumbnail.
    pub small: ThumbnailObject,
    /// ≤800×800 preview.
    pub medium: ThumbnailObject,
    /// ≤3840×2160 preview.
    pub large: ThumbnailObject,
}

impl ThumbnailRefs {
    /// The object of one tier.
    pub fn get(&self, tier: ThumbnailTier) -> &ThumbnailObject {
        match tier {
            ThumbnailTier::Small => &self.small,
            ThumbnailTier::Medium => &self.medium,
            ThumbnailTier::Large => &self.large,
        }
    }

    /// Storage paths of all three objects.
    pub fn storage_paths(&self) -> [&str; 3] {
        [
            self.small.storage_path.as_str(),
            self.medium.storage_path.as_str(),
            self.large.storage_path.as_str(),
        ]
    }
}

/// Persisted asset state of one part.
///
/// Written only by the sync pipeline; every path it names refers to an
/// object that exists in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// The part this record belongs to.
    pub part_id: PartId,
    /// The slot thumbnails are derived from.
    pub primary_source: Option<SourceSlot>,
    /// 2D drawing metadata.
    pub drawing_2d: Option<SlotFileMeta>,
    /// 3D model metadata.
    pub model_3d: Option<SlotFileMeta>,
    /// User photo metadata.
    pub user: Option<SlotFileMeta>,
    /// The live thumbnail set.
    pub thumbnails: Option<ThumbnailRefs>,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    /// An empty record for a part with no assets.
    pub fn empty(part_id: PartId) -> Self {
        Self {
            part_id,
            primary_source: None,
            drawing_2d: None,
            model_3d: None,
            user: None,
            thumbnails: None,
            updated_at: Utc::now(),
        }
    }

    /// Metadata of one slot.
    pub fn slot(&self, slot: SourceSlot) -> Option<&SlotFileMeta> {
        match slot {
            SourceSlot::Drawing2D => self.drawing_2d.as_ref(),
            SourceSlot::Model3D => self.model_3d.as_ref(),
            SourceSlot::User => self.user.as_ref(),
        }
    }

    /// Mutable metadata of one slot.
    pub fn slot_mut(&mut self, slot: SourceSlot) -> &mut Option<SlotFileMeta> {
        match slot {
            SourceSlot::Drawing2D => &mut self.drawing_2d,
            SourceSlot::Model3D => &mut self.model_3d,
            SourceSlot::User => &mut self.user,
        }
    }

    /// Every blob store path the record references.
    pub fn referenced_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = SourceSlot::ALL
            .iter()
            .filter_map(|s| self.slot(*s))
            .map(|m| m.storage_path.as_str())
            .collect();
        if let Some(thumbs) = &self.thumbnails {
            paths.extend(thumbs.storage_paths());
        }
        paths
    }
}
