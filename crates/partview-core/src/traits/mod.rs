//! Core traits defined in `partview-core` and implemented by other crates.

pub mod metadata;
pub mod storage;

pub use metadata::MetadataStore;
pub use storage::{BlobMeta, BlobStore};
