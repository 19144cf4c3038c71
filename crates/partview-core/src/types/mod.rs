//! Core type definitions used across the PartView workspace.

pub mod asset;
pub mod id;
pub mod source;

pub use asset::{AssetRecord, SlotFileMeta, ThumbnailObject, ThumbnailRefs, ThumbnailTier};
pub use id::{GenerationId, PartId};
pub use source::{
    EncodedPayload, RawValue, SourceFile, SourceKind, SourceSlot, content_type_for, extension_of,
};
