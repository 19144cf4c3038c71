//! The rendering façade.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use partview_core::config::renderer::RendererConfig;
use partview_core::types::SourceFile;

use crate::backend::{
    DxfBackend, MeshConverterBackend, OdaDwgBackend, RenderBackend, StepPointsBackend, StlBackend,
};
use crate::capabilities::{BackendSpec, Capabilities};
use crate::error::BackendError;
use crate::executor::ProcessRunner;
use crate::info::CadInfo;
use crate::metrics::RenderMetrics;
use crate::models::{BackendAttempt, BoundingBox, RenderResult, Resolution};
use crate::render::placeholder;

/// `backend_used` value for placeholder results.
pub const PLACEHOLDER_BACKEND: &str = "placeholder";

/// Renders source files, falling back to a placeholder.
///
/// Backends are tried in probe order; errors and panics in one backend
/// move on to the next. [`CadRenderer::render`] itself never fails.
#[derive(Debug, Clone)]
pub struct CadRenderer {
    backends: Vec<Arc<dyn RenderBackend>>,
    metrics: Arc<RenderMetrics>,
}

impl CadRenderer {
    /// Build adapters for every backend the probe found available.
    pub fn new(capabilities: &Capabilities, config: &RendererConfig, metrics: Arc<RenderMetrics>) -> Self {
        let runner = ProcessRunner::new(config);
        let backends = capabilities
            .available()
            .map(|spec| -> Arc<dyn RenderBackend> {
                match spec {
                    BackendSpec::Dxf => Arc::new(DxfBackend::new()),
                    BackendSpec::OdaDwg { program } => {
                        Arc::new(OdaDwgBackend::new(program.clone(), runner.clone()))
                    }
                    BackendSpec::Stl => Arc::new(StlBackend::new()),
                    BackendSpec::MeshConverter {
                        name,
                        program,
                        args,
                        extensions,
                    } => Arc::new(MeshConverterBackend::new(
                        name,
                        program.clone(),
                        args.clone(),
                        extensions,
                        runner.clone(),
                    )),
                    BackendSpec::StepPoints => Arc::new(StepPointsBackend::new()),
                }
            })
            .collect();
        Self::with_backends(backends, metrics)
    }

    /// Use an explicit backend list.
    pub fn with_backends(backends: Vec<Arc<dyn RenderBackend>>, metrics: Arc<RenderMetrics>) -> Self {
        Self { backends, metrics }
    }

    /// Ids of the configured backends, in attempt order.
    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    pub fn metrics(&self) -> &Arc<RenderMetrics> {
        &self.metrics
    }

    /// Render `file` at `target`.
    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.size_bytes))]
    pub async fn render(&self, file: &SourceFile, target: Resolution) -> RenderResult {
        let start = Instant::now();
        self.metrics.record_started();

        let mut attempts = Vec::new();
        let mut salvaged: Option<BoundingBox> = None;

        let candidates = self
            .backends
            .iter()
            .filter(|b| b.kind() == file.kind && b.supports(&file.extension));

        for backend in candidates {
            debug!(backend = backend.id(), "Trying render backend");
            let outcome = AssertUnwindSafe(backend.try_render(file, target))
                .catch_unwind()
                .await;

            let (reason, bbox) = match outcome {
                Ok(Ok(output)) if !output.png.is_empty() => {
                    let duration = start.elapsed();
                    self.metrics
                        .record_finished(duration, output.png.len() as u64, false);
                    info!(
                        backend = backend.id(),
                        width = output.width,
                        height = output.height,
                        duration_ms = duration.as_millis() as u64,
                        "Rendered source file"
                    );
                    return RenderResult {
                        image_bytes: output.png,
                        pixel_width: output.width,
                        pixel_height: output.height,
                        bounding_box: output.bounding_box,
                        backend_used: backend.id().to_string(),
                        degraded: false,
                        caption: Vec::new(),
                        attempts,
                    };
                }
                Ok(Ok(output)) => {
                    self.metrics.record_backend_failure();
                    ("backend produced an empty image".to_string(), output.bounding_box)
                }
                Ok(Err(failure)) => {
                    if matches!(failure.error, BackendError::Panicked(_)) {
                        self.metrics.record_panic();
                    } else {
                        self.metrics.record_backend_failure();
                    }
                    (failure.error.to_string(), failure.salvaged_bbox)
                }
                Err(panic) => {
                    self.metrics.record_panic();
                    let reason = BackendError::Panicked(panic_message(panic.as_ref())).to_string();
                    (reason, None)
                }
            };

            warn!(backend = backend.id(), reason = %reason, "Render backend failed, trying next");
            if bbox.is_some() {
                salvaged = bbox;
            }
            attempts.push(BackendAttempt {
                backend: backend.id().to_string(),
                reason,
            });
        }

        let result = self.placeholder(file, target, salvaged, attempts).await;
        self.metrics
            .record_finished(start.elapsed(), result.image_bytes.len() as u64, true);
        result
    }

    /// Describe `file` without rendering it.
    #[instrument(skip(self, file), fields(filename = %file.filename))]
    pub async fn inspect(&self, file: &SourceFile) -> CadInfo {
        let owned = file.clone();
        match tokio::task::spawn_blocking(move || CadInfo::inspect(&owned)).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "Inspect task failed");
                CadInfo {
                    file_name: file.filename.clone(),
                    size_bytes: file.size_bytes,
                    kind: file.kind,
                    dxf: None,
                    error: Some(BackendError::from(e).to_string()),
                }
            }
        }
    }

    async fn placeholder(
        &self,
        file: &SourceFile,
        target: Resolution,
        salvaged: Option<BoundingBox>,
        attempts: Vec<BackendAttempt>,
    ) -> RenderResult {
        warn!(
            filename = %file.filename,
            attempted = attempts.len(),
            "No backend rendered the file, using placeholder"
        );

        let owned = file.clone();
        let generated =
            tokio::task::spawn_blocking(move || placeholder::generate(&owned, target, salvaged.as_ref()))
                .await;
        let placeholder = match generated {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Placeholder task failed, generating inline");
                placeholder::generate(file, target, salvaged.as_ref())
            }
        };

        RenderResult {
            image_bytes: placeholder.png,
            pixel_width: placeholder.width,
            pixel_height: placeholder.height,
            bounding_box: None,
            backend_used: PLACEHOLDER_BACKEND.to_string(),
            degraded: true,
            caption: placeholder.caption,
            attempts,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
