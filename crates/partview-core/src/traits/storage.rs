//! Blob store trait for pluggable object storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobMeta {
    /// Path within the store.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Content type recorded at upload, if known.
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Trait for durable blob storage.
///
/// Paths are `/`-separated and relative to the store root. The trait is
/// defined here in `partview-core` and implemented in `partview-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write an object, replacing any existing one at `path`.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Read an object into memory.
    async fn get(&self, path: &str) -> AppResult<Bytes>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// List every object whose path starts with `prefix`, recursively.
    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>>;

    /// Check whether an object exists.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// The URL under which an object is published.
    fn public_url(&self, path: &str) -> String;
}
