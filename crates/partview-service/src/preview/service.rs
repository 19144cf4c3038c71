//! Serves stored thumbnails to the display layer.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use partview_core::result::AppResult;
use partview_core::traits::{BlobStore, MetadataStore};
use partview_core::types::{AssetRecord, PartId, SourceSlot, ThumbnailTier};

use super::cache::PreviewCache;

/// One thumbnail ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Thumbnail {
    pub tier: ThumbnailTier,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub storage_path: String,
    pub generated_from: SourceSlot,
    /// Whether the image is a placeholder.
    pub degraded: bool,
    /// PNG bytes.
    #[serde(skip)]
    pub data: Bytes,
}

/// Reads the live thumbnail set of a part through a [`PreviewCache`].
#[derive(Debug, Clone)]
pub struct PreviewService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: PreviewCache,
}

impl PreviewService {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>, cache: PreviewCache) -> Self {
        Self {
            metadata,
            blobs,
            cache,
        }
    }

    /// The record currently in force.
    pub async fn record(&self, part_id: PartId) -> AppResult<Option<AssetRecord>> {
        self.metadata.load_record(part_id).await
    }

    /// The thumbnail of `tier`, or `None` when the part has no thumbnails.
    pub async fn thumbnail(&self, part_id: PartId, tier: ThumbnailTier) -> AppResult<Option<Thumbnail>> {
        let Some(refs) = self
            .metadata
            .load_record(part_id)
            .await?
            .and_then(|r| r.thumbnails)
        else {
            return Ok(None);
        };
        let object = refs.get(tier);

        let data = match self.cache.get(&object.storage_path).await {
            Some(data) => data,
            None => {
                let data = self.blobs.get(&object.storage_path).await?;
                debug!(%part_id, path = %object.storage_path, bytes = data.len(), "Loaded thumbnail from store");
                self.cache.insert(object.storage_path.clone(), data.clone()).await;
                data
            }
        };

        Ok(Some(Thumbnail {
            tier,
            width: object.width,
            height: object.height,
            url: object.url.clone(),
            storage_path: object.storage_path.clone(),
            generated_from: refs.generated_from,
            degraded: refs.degraded,
            data,
        }))
    }

    /// Drop a part's cached images.
    pub async fn invalidate_part(&self, part_id: PartId) -> u64 {
        self.cache.invalidate_part(part_id).await
    }

    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }
}
