//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use partview_cad::{CadRenderer, Capabilities, RenderMetrics};
use partview_core::config::AppConfig;
use partview_core::config::renderer::RendererConfig;
use partview_core::config::storage::{LocalStorageConfig, StorageConfig};
use partview_core::traits::BlobStore;
use partview_core::types::{EncodedPayload, PartId, SourceFile};
use partview_service::{AssetSyncManager, PreviewCache, PreviewService};
use partview_storage::{MemoryBlobStore, MemoryMetadataStore, StorageManager};
use partview_transport::{TransportLayer, encode};

/// Test application context
pub struct TestApp {
    /// Metadata rows of every part
    pub metadata: Arc<MemoryMetadataStore>,
    /// The configured blob store
    pub blobs: Arc<dyn BlobStore>,
    /// Set when the blob store is in memory, for failure injection
    pub memory: Option<Arc<MemoryBlobStore>>,
    pub sync: AssetSyncManager,
    pub previews: PreviewService,
    pub config: AppConfig,
    _dir: Option<TempDir>,
}

impl TestApp {
    /// Application backed by an in-memory blob store.
    pub fn in_memory() -> Self {
        let memory = Arc::new(MemoryBlobStore::new());
        Self::build(AppConfig::default(), memory.clone(), Some(memory), None)
    }

    /// Application backed by a local blob store in a temporary directory,
    /// built from configuration like the binary does.
    pub async fn on_disk() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            storage: StorageConfig {
                provider: "local".to_string(),
                public_base_url: "https://assets.example.com/".to_string(),
                local: LocalStorageConfig {
                    root_path: dir.path().join("blobs").to_string_lossy().to_string(),
                },
            },
            ..AppConfig::default()
        };
        let storage = StorageManager::from_config(&config.storage)
            .await
            .expect("storage");
        Self::build(config, storage.store(), None, Some(dir))
    }

    fn build(
        mut config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        memory: Option<Arc<MemoryBlobStore>>,
        dir: Option<TempDir>,
    ) -> Self {
        config.renderer = builtin_renderer_config();
        config.sync.render_width = 640;
        config.sync.render_height = 480;

        let capabilities = Capabilities::probe(&config.renderer);
        let renderer = Arc::new(CadRenderer::new(
            &capabilities,
            &config.renderer,
            Arc::new(RenderMetrics::new()),
        ));
        let metadata = Arc::new(MemoryMetadataStore::new());
        let sync = AssetSyncManager::new(metadata.clone(), blobs.clone(), renderer, &config.sync);
        let previews = PreviewService::new(
            metadata.clone(),
            blobs.clone(),
            PreviewCache::new(&config.preview_cache),
        );

        Self {
            metadata,
            blobs,
            memory,
            sync,
            previews,
            config,
            _dir: dir,
        }
    }

    /// The in-memory store; panics for disk-backed apps.
    pub fn memory(&self) -> &MemoryBlobStore {
        self.memory.as_deref().expect("in-memory blob store")
    }

    /// Store `bytes` hex-escaped in a metadata field, the way the part
    /// table returns binary columns.
    pub fn store_field(&self, part_id: PartId, field: &str, bytes: &[u8]) {
        let raw = encode(bytes, &[TransportLayer::Hex { marker: true, uppercase: false }]);
        self.metadata
            .set_payload(part_id, field, EncodedPayload { raw, hint: None });
    }

    /// Paths under `prefix`, sorted.
    pub async fn paths(&self, prefix: &str) -> Vec<String> {
        self.blobs
            .list(prefix)
            .await
            .expect("list")
            .into_iter()
            .map(|m| m.path)
            .collect()
    }

    /// Names of the directories directly below `prefix` in a disk-backed
    /// store, sorted. Empty when `prefix` does not exist.
    pub fn subdirectories(&self, prefix: &str) -> Vec<String> {
        let root = std::path::Path::new(&self.config.storage.local.root_path);
        let Ok(entries) = std::fs::read_dir(root.join(prefix)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    pub async fn thumbnail_paths(&self, part_id: PartId) -> Vec<String> {
        self.paths(&format!("thumbnails/{part_id}/")).await
    }

    pub async fn source_paths(&self, part_id: PartId) -> Vec<String> {
        self.paths(&format!("sources/{part_id}/")).await
    }
}

/// Built-in backends only, so tests never depend on installed tools.
fn builtin_renderer_config() -> RendererConfig {
    RendererConfig {
        backend_order: ["dxf", "stl", "step-points"]
            .into_iter()
            .map(String::from)
            .collect(),
        mesh_converters: Vec::new(),
        ..RendererConfig::default()
    }
}

/// A DXF document with one axis-aligned rectangle.
pub fn dxf_rectangle(width: f64, height: f64) -> Vec<u8> {
    let line = |x1: f64, y1: f64, x2: f64, y2: f64| {
        format!("0\nLINE\n8\n0\n10\n{x1}\n20\n{y1}\n30\n0.0\n11\n{x2}\n21\n{y2}\n31\n0.0\n")
    };
    let entities = [
        line(0.0, 0.0, width, 0.0),
        line(width, 0.0, width, height),
        line(width, height, 0.0, height),
        line(0.0, height, 0.0, 0.0),
    ]
    .concat();
    format!("0\nSECTION\n2\nENTITIES\n{entities}0\nENDSEC\n0\nEOF\n").into_bytes()
}

/// A solid-colour PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([30, 90, 160, 255]));
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

pub fn drawing_file(name: &str) -> SourceFile {
    SourceFile::new(name, dxf_rectangle(200.0, 100.0)).expect("dxf source")
}

pub fn photo_file(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, png(width, height)).expect("photo source")
}
