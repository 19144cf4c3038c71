//! Built-in STL backend.

use async_trait::async_trait;
use bytes::Bytes;

use partview_core::types::{SourceFile, SourceKind};

use super::{RenderBackend, run_blocking};
use crate::error::BackendFailure;
use crate::formats::stl;
use crate::models::{RenderOutput, Resolution};
use crate::render::solid;

/// Renders STL meshes in-process.
#[derive(Debug, Default, Clone)]
pub struct StlBackend;

impl StlBackend {
    pub const ID: &'static str = "stl";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderBackend for StlBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SolidModel
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "stl"
    }

    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure> {
        render_stl(file.bytes.clone(), target).await
    }
}

/// Parse and shade STL bytes on the blocking pool.
pub(crate) async fn render_stl(data: Bytes, target: Resolution) -> Result<RenderOutput, BackendFailure> {
    run_blocking(move || {
        let mesh = stl::parse(&data)?;
        solid::render_mesh(&mesh, target)
    })
    .await
}
