//! # partview-storage
//!
//! Blob store providers (local filesystem and in-memory), an in-memory
//! metadata store, the object layout shared by every provider, and the
//! thumbnail deriver.

pub mod layout;
pub mod manager;
pub mod metadata;
pub mod providers;
pub mod thumbnail;

pub use manager::StorageManager;
pub use metadata::MemoryMetadataStore;
pub use providers::{LocalBlobStore, MemoryBlobStore};
pub use thumbnail::{ThumbnailDeriver, ThumbnailImage, ThumbnailSet};
