//! Built-in DXF backend.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use partview_core::types::{SourceFile, SourceKind};

use super::{RenderBackend, run_blocking};
use crate::error::BackendFailure;
use crate::formats::dxf;
use crate::models::{RenderOutput, Resolution};
use crate::render::vector;

/// Renders ASCII DXF drawings in-process.
#[derive(Debug, Default, Clone)]
pub struct DxfBackend;

impl DxfBackend {
    pub const ID: &'static str = "dxf";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderBackend for DxfBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::VectorDrawing
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "dxf"
    }

    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure> {
        render_dxf(file.bytes.clone(), target).await
    }
}

/// Parse and rasterize DXF bytes on the blocking pool.
pub(crate) async fn render_dxf(data: Bytes, target: Resolution) -> Result<RenderOutput, BackendFailure> {
    run_blocking(move || {
        let drawing = dxf::parse(&data)?;
        debug!(
            version = ?drawing.version,
            entities = ?drawing.entity_counts,
            skipped = ?drawing.skipped,
            "Parsed DXF drawing"
        );
        Ok(vector::render_drawing(&drawing, target)?)
    })
    .await
}
