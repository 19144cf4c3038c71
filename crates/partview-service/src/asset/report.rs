//! Outcome of a sync.

use serde::{Deserialize, Serialize};

use partview_core::types::{AssetRecord, SourceSlot};

/// What happened to the part's thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewOutcome {
    /// A new thumbnail set is live.
    Updated {
        /// Slot the thumbnails were derived from.
        generated_from: SourceSlot,
        /// Whether the image is a placeholder.
        degraded: bool,
    },
    /// The previous thumbnails, if any, are still live.
    Unchanged,
    /// Every slot is empty and the thumbnails were retired.
    Cleared,
}

/// A non-fatal problem with one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWarning {
    pub slot: SourceSlot,
    pub message: String,
}

impl SlotWarning {
    pub fn new(slot: SourceSlot, message: impl Into<String>) -> Self {
        Self {
            slot,
            message: message.into(),
        }
    }
}

/// Result of a committed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// The record now in force.
    pub record: AssetRecord,
    pub preview: PreviewOutcome,
    pub warnings: Vec<SlotWarning>,
}
