//! What the save action provides for each source slot.

use partview_core::types::{SourceFile, SourceSlot};

/// Contents of one slot at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotInput {
    /// The slot has no file.
    #[default]
    Empty,
    /// Fresh bytes from the save action.
    Uploaded(SourceFile),
    /// Unchanged file whose bytes live in the metadata store under
    /// `field`, still transport-encoded.
    Stored {
        /// Metadata field holding the payload.
        field: String,
        /// Original file name.
        filename: String,
    },
}

impl SlotInput {
    /// Shorthand for [`SlotInput::Stored`].
    pub fn stored(field: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::Stored {
            field: field.into(),
            filename: filename.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// The three slots of a part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInputs {
    pub drawing_2d: SlotInput,
    pub model_3d: SlotInput,
    pub user: SlotInput,
}

impl SlotInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, slot: SourceSlot, input: SlotInput) -> Self {
        *self.get_mut(slot) = input;
        self
    }

    pub fn get(&self, slot: SourceSlot) -> &SlotInput {
        match slot {
            SourceSlot::Drawing2D => &self.drawing_2d,
            SourceSlot::Model3D => &self.model_3d,
            SourceSlot::User => &self.user,
        }
    }

    pub fn get_mut(&mut self, slot: SourceSlot) -> &mut SlotInput {
        match slot {
            SourceSlot::Drawing2D => &mut self.drawing_2d,
            SourceSlot::Model3D => &mut self.model_3d,
            SourceSlot::User => &mut self.user,
        }
    }

    /// Whether every slot is empty.
    pub fn all_empty(&self) -> bool {
        SourceSlot::ALL.iter().all(|s| self.get(*s).is_empty())
    }

    /// The slot thumbnails should come from.
    ///
    /// `primary` wins when its slot has a file; otherwise the first
    /// non-empty slot in [`SourceSlot::FALLBACK_ORDER`].
    pub fn select(&self, primary: Option<SourceSlot>) -> Option<SourceSlot> {
        if let Some(slot) = primary.filter(|s| !self.get(*s).is_empty()) {
            return Some(slot);
        }
        SourceSlot::FALLBACK_ORDER
            .into_iter()
            .find(|s| !self.get(*s).is_empty())
    }
}
