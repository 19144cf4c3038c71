//! PartView asset host.
//!
//! Wires the blob store, the CAD renderer and the sync and preview
//! services together and reports what this host can render. The hosting
//! application embeds the library crates; this binary checks a
//! deployment.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use partview_cad::{CadRenderer, Capabilities, RenderMetrics};
use partview_core::config::AppConfig;
use partview_core::error::AppError;
use partview_service::{AssetSyncManager, PreviewCache, PreviewService};
use partview_storage::{MemoryMetadataStore, StorageManager};

#[tokio::main]
async fn main() {
    let env = std::env::var("PARTVIEW_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Asset host error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PartView asset host v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Blob store ───────────────────────────────────────
    let storage = StorageManager::from_config(&config.storage).await?;
    let healthy = storage.health_check().await;
    if healthy {
        tracing::info!(provider = storage.store().provider_type(), "Blob store healthy");
    } else {
        tracing::warn!(provider = storage.store().provider_type(), "Blob store is not reachable");
    }

    // ── Step 2: Probe render backends once ───────────────────────
    let capabilities = Capabilities::probe(&config.renderer);
    let available = capabilities.entries().iter().filter(|b| b.is_available()).count();
    if available == 0 {
        tracing::warn!("No render backend available, CAD previews will be placeholders");
    }
    let metrics = Arc::new(RenderMetrics::new());
    let renderer = Arc::new(CadRenderer::new(
        &capabilities,
        &config.renderer,
        Arc::clone(&metrics),
    ));
    tracing::info!(backends = ?renderer.backend_ids(), "CAD renderer ready");

    // ── Step 3: Services ─────────────────────────────────────────
    // the hosting application supplies its own metadata store
    let metadata = Arc::new(MemoryMetadataStore::new());
    let _sync = AssetSyncManager::new(
        metadata.clone(),
        storage.store(),
        Arc::clone(&renderer),
        &config.sync,
    );
    let _previews = PreviewService::new(
        metadata,
        storage.store(),
        PreviewCache::new(&config.preview_cache),
    );
    tracing::info!(
        render_width = config.sync.render_width,
        render_height = config.sync.render_height,
        "Asset services ready"
    );

    tracing::info!(
        blob_store_healthy = healthy,
        metrics = ?metrics.snapshot(),
        "Asset host initialized"
    );
    Ok(())
}
