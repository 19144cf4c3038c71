//! # partview-service
//!
//! Orchestration for PartView assets. [`AssetSyncManager`] turns a saved
//! part's source files into a stored thumbnail set and an
//! [`partview_core::types::AssetRecord`]; [`PreviewService`] serves the
//! stored thumbnails through a sized cache.
//!
//! Services follow constructor injection: stores and the renderer are
//! provided at construction time via `Arc` references.

pub mod asset;
pub mod error;
pub mod preview;

pub use asset::{
    AssetSyncManager, PartLocks, PreviewOutcome, SlotInput, SlotInputs, SlotWarning, SyncReport,
    SyncTask,
};
pub use error::SyncError;
pub use preview::{PreviewCache, PreviewService, Thumbnail};
