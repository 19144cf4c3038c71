//! In-process cache of thumbnail bytes using moka.

use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use partview_core::config::preview::PreviewCacheConfig;
use partview_core::types::PartId;
use partview_storage::layout;

/// Thumbnail bytes keyed by storage path, weighed by size.
///
/// Storage paths carry the generation, so a superseded set is never
/// served after the record moves on; its entries age out or are dropped
/// by [`PreviewCache::invalidate_part`].
#[derive(Debug, Clone)]
pub struct PreviewCache {
    cache: Cache<String, Bytes>,
}

impl PreviewCache {
    pub fn new(config: &PreviewCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity_bytes)
            .weigher(|key: &String, value: &Bytes| {
                u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
            })
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();
        Self { cache }
    }

    pub async fn get(&self, storage_path: &str) -> Option<Bytes> {
        self.cache.get(storage_path).await
    }

    pub async fn insert(&self, storage_path: impl Into<String>, data: Bytes) {
        self.cache.insert(storage_path.into(), data).await;
    }

    /// Drop every cached image of a part. Returns how many were removed.
    pub async fn invalidate_part(&self, part_id: PartId) -> u64 {
        let prefix = layout::thumbnail_prefix(part_id);
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|entry| entry.0.starts_with(&prefix))
            .map(|entry| entry.0.to_string())
            .collect();

        let mut count = 0u64;
        for key in keys {
            self.cache.remove(&key).await;
            count += 1;
        }
        debug!(%part_id, count, "Invalidated cached thumbnails");
        count
    }

    /// Approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Total weight of cached entries in bytes.
    pub fn weighted_size(&self) -> u64 {
        self.cache.weighted_size()
    }

    /// Apply pending evictions and counters.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}
