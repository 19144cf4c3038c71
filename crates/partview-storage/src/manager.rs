//! Storage manager: builds the configured blob store.

use std::sync::Arc;

use tracing::info;

use partview_core::config::storage::StorageConfig;
use partview_core::error::AppError;
use partview_core::result::AppResult;
use partview_core::traits::storage::BlobStore;

use crate::providers::{LocalBlobStore, MemoryBlobStore};

/// Holds the blob store selected by configuration.
#[derive(Debug, Clone)]
pub struct StorageManager {
    store: Arc<dyn BlobStore>,
}

impl StorageManager {
    /// Wrap an existing store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Build the provider named by `config.provider`.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let store: Arc<dyn BlobStore> = match config.provider.as_str() {
            "local" => Arc::new(
                LocalBlobStore::new(&config.local.root_path)
                    .await?
                    .with_public_base_url(config.public_base_url.clone()),
            ),
            "memory" => {
                Arc::new(MemoryBlobStore::new().with_public_base_url(config.public_base_url.clone()))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider '{other}', expected 'local' or 'memory'"
                )));
            }
        };
        info!(provider = store.provider_type(), "Blob store initialized");
        Ok(Self { store })
    }

    /// The active store.
    pub fn store(&self) -> Arc<dyn BlobStore> {
        Arc::clone(&self.store)
    }

    /// Whether the store is reachable. Errors count as unhealthy.
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }
}
