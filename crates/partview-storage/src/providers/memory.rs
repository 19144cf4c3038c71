//! In-memory blob store.
//!
//! Used by tests and by the `memory` provider. Failures can be injected
//! per path fragment to exercise error paths of callers.

use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use partview_core::error::AppError;
use partview_core::result::AppResult;
use partview_core::traits::storage::{BlobMeta, BlobStore};

use super::join_url;

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    modified: DateTime<Utc>,
}

/// Blob store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, StoredBlob>,
    public_base_url: Option<String>,
    failing_puts: RwLock<Vec<String>>,
    failing_deletes: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish objects under `base` instead of `memory://` URLs.
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.public_base_url = (!base.is_empty()).then_some(base);
        self
    }

    /// Make every `put` to a path containing `fragment` fail.
    pub fn fail_puts_containing(&self, fragment: impl Into<String>) {
        if let Ok(mut failing) = self.failing_puts.write() {
            failing.push(fragment.into());
        }
    }

    /// Make every `delete` of a path containing `fragment` fail.
    pub fn fail_deletes_containing(&self, fragment: impl Into<String>) {
        if let Ok(mut failing) = self.failing_deletes.write() {
            failing.push(fragment.into());
        }
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        for list in [&self.failing_puts, &self.failing_deletes] {
            if let Ok(mut failing) = list.write() {
                failing.clear();
            }
        }
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Content type recorded for `path`.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.get(path).map(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn injected(list: &RwLock<Vec<String>>, path: &str) -> bool {
        list.read()
            .map(|failing| failing.iter().any(|f| path.contains(f.as_str())))
            .unwrap_or(false)
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let path = normalize(path);
        if Self::injected(&self.failing_puts, path) {
            return Err(AppError::storage(format!("Injected write failure: {path}")));
        }
        debug!(path, bytes = data.len(), "Stored object in memory");
        self.objects.insert(
            path.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        let path = normalize(path);
        self.objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {path}")))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let path = normalize(path);
        if Self::injected(&self.failing_deletes, path) {
            return Err(AppError::storage(format!("Injected delete failure: {path}")));
        }
        self.objects.remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        let prefix = normalize(prefix);
        let mut objects: Vec<BlobMeta> = self
            .objects
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| BlobMeta {
                path: e.key().clone(),
                size_bytes: e.data.len() as u64,
                content_type: Some(e.content_type.clone()),
                last_modified: Some(e.modified),
            })
            .collect();
        objects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(objects)
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(normalize(path)))
    }

    fn public_url(&self, path: &str) -> String {
        match &self.public_base_url {
            Some(base) => join_url(base, path),
            None => format!("memory://{}", normalize(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partview_core::error::ErrorKind;

    #[tokio::test]
    async fn test_roundtrip_and_listing() {
        let store = MemoryBlobStore::new();
        store
            .put("/thumbnails/p/g/small.png", Bytes::from_static(b"a"), "image/png")
            .await
            .expect("put");
        store
            .put("sources/p/2d/g-a.dxf", Bytes::from_static(b"bc"), "application/dxf")
            .await
            .expect("put");

        assert_eq!(store.get("thumbnails/p/g/small.png").await.expect("get"), "a");
        assert_eq!(store.content_type("sources/p/2d/g-a.dxf").as_deref(), Some("application/dxf"));
        let listed = store.list("sources/").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size_bytes, 2);
        assert_eq!(store.public_url("a/b.png"), "memory://a/b.png");
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryBlobStore::new();
        store.fail_puts_containing("large.png");
        let err = store
            .put("thumbnails/p/g/large.png", Bytes::from_static(b"x"), "image/png")
            .await
            .expect_err("injected");
        assert_eq!(err.kind, ErrorKind::Storage);

        store.put("keep.png", Bytes::from_static(b"x"), "image/png").await.expect("put");
        store.fail_deletes_containing("keep");
        assert!(store.delete("keep.png").await.is_err());

        store.clear_failures();
        store.delete("keep.png").await.expect("delete");
        assert!(store.is_empty());
    }
}
