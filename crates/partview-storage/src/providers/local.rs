//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use partview_core::error::{AppError, ErrorKind};
use partview_core::result::AppResult;
use partview_core::traits::storage::{BlobMeta, BlobStore};
use partview_core::types::{content_type_for, extension_of};

use super::join_url;

/// Blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all objects.
    root: PathBuf,
    /// Base for public URLs; `file://` URLs when `None`.
    public_base_url: Option<String>,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        // absolute root keeps file:// URLs stable
        let root = fs::canonicalize(&root).await.unwrap_or(root);
        Ok(Self {
            root,
            public_base_url: None,
        })
    }

    /// Publish objects under `base` instead of `file://` URLs.
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.public_base_url = (!base.is_empty()).then_some(base);
        self
    }

    /// Resolve an object path inside the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = path.trim_start_matches('/');
        let relative = Path::new(clean);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid object path: {path}")));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Remove the directories above `full` that became empty, stopping at
    /// the root or the first directory that still has entries.
    async fn prune_empty_parents(&self, full: &Path) {
        let mut current = full.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            match fs::remove_dir(dir).await {
                Ok(()) => debug!(dir = %dir.display(), "Removed empty directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(_) => break,
            }
            current = dir.parent();
        }
    }

    /// Object path of a file below the root, `/`-separated.
    fn object_path(&self, full: &Path) -> Option<String> {
        let relative = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let mut written = fs::write(&full_path, &data).await;
        if matches!(&written, Err(e) if e.kind() == std::io::ErrorKind::NotFound) {
            // a concurrent delete pruned the directory we just created
            self.ensure_parent(&full_path).await?;
            written = fs::write(&full_path, &data).await;
        }
        written.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write object: {path}"), e)
        })?;

        debug!(path, bytes = data.len(), content_type, "Wrote object");
        Ok(())
    }

    async fn get(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {path}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read object: {path}"), e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(path, "Deleted object");
                self.prune_empty_parents(&full_path).await;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete object: {path}"),
                e,
            )),
        }
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobMeta>> {
        let prefix = prefix.trim_start_matches('/');
        // walk from the deepest directory the prefix names
        let base = match prefix.rfind('/') {
            Some(idx) => self.resolve(&prefix[..idx])?,
            None => self.root.clone(),
        };
        if !fs::try_exists(&base).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![base];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list directory: {}", dir.display()),
                    e,
                )
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
            })? {
                let meta = entry.metadata().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
                })?;
                let full = entry.path();
                if meta.is_dir() {
                    pending.push(full);
                    continue;
                }
                let Some(path) = self.object_path(&full) else {
                    continue;
                };
                if !path.starts_with(prefix) {
                    continue;
                }
                objects.push(BlobMeta {
                    content_type: Some(content_type_for(&extension_of(&path)).to_string()),
                    size_bytes: meta.len(),
                    last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
                    path,
                });
            }
        }

        objects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(objects)
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    fn public_url(&self, path: &str) -> String {
        match &self.public_base_url {
            Some(base) => join_url(base, path),
            None => {
                let root = self.root.to_string_lossy().replace('\\', "/");
                format!("file://{}", join_url(&root, path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(dir.path().to_str().expect("utf-8 path"))
            .await
            .expect("store")
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir).await;

        let data = Bytes::from_static(b"png bytes");
        store
            .put("thumbnails/p/g/small.png", data.clone(), "image/png")
            .await
            .expect("put");
        assert!(store.exists("thumbnails/p/g/small.png").await.expect("exists"));
        assert_eq!(store.get("thumbnails/p/g/small.png").await.expect("get"), data);

        store.delete("thumbnails/p/g/small.png").await.expect("delete");
        assert!(!store.exists("thumbnails/p/g/small.png").await.expect("exists"));
        // idempotent
        store.delete("thumbnails/p/g/small.png").await.expect("delete again");

        let missing = store.get("thumbnails/p/g/small.png").await.expect_err("missing");
        assert_eq!(missing.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_is_recursive_and_prefix_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir).await;
        for path in [
            "thumbnails/a/g1/small.png",
            "thumbnails/a/g2/small.png",
            "thumbnails/ab/g1/small.png",
            "sources/a/2d/x.dxf",
        ] {
            store.put(path, Bytes::from_static(b"x"), "image/png").await.expect("put");
        }

        let listed: Vec<String> = store
            .list("thumbnails/a/")
            .await
            .expect("list")
            .into_iter()
            .map(|m| m.path)
            .collect();
        assert_eq!(listed, vec!["thumbnails/a/g1/small.png", "thumbnails/a/g2/small.png"]);

        assert_eq!(store.list("thumbnails/a").await.expect("list").len(), 3);
        assert!(store.list("nothing/here/").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir).await;
        store
            .put("thumbnails/p/keep/small.png", Bytes::from_static(b"x"), "image/png")
            .await
            .expect("put");
        for n in 0..5 {
            let path = format!("thumbnails/p/gen{n}/small.png");
            store.put(&path, Bytes::from_static(b"x"), "image/png").await.expect("put");
            store.delete(&path).await.expect("delete");
        }

        let part_dir = dir.path().join("thumbnails").join("p");
        let mut remaining = Vec::new();
        let mut entries = fs::read_dir(&part_dir).await.expect("read_dir");
        while let Some(entry) = entries.next_entry().await.expect("entry") {
            remaining.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(remaining, vec!["keep"]);

        store.delete("thumbnails/p/keep/small.png").await.expect("delete");
        assert!(!fs::try_exists(dir.path().join("thumbnails")).await.expect("exists"));
        // the root itself stays
        assert!(store.health_check().await.expect("health"));
        store
            .put("thumbnails/p/again/small.png", Bytes::from_static(b"x"), "image/png")
            .await
            .expect("put after prune");
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir).await;
        let err = store
            .put("../outside.png", Bytes::from_static(b"x"), "image/png")
            .await
            .expect_err("escape");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_public_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = store(&dir).await;
        assert!(local.public_url("a/b.png").starts_with("file://"));
        assert!(local.public_url("a/b.png").ends_with("/a/b.png"));

        let published = local.with_public_base_url("https://cdn.example.com/assets/");
        assert_eq!(
            published.public_url("/a/b.png"),
            "https://cdn.example.com/assets/a/b.png"
        );
    }
}
