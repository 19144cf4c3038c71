//! Render backends.
//!
//! Each backend is a strategy object that can turn one family of files
//! into a raster. The [`crate::CadRenderer`] holds an ordered list of the
//! backends that were available at start-up and tries them in turn.

pub mod dwg;
pub mod dxf;
pub mod mesh_converter;
pub mod step_points;
pub mod stl;

use async_trait::async_trait;
use std::fmt::Debug;

use partview_core::types::{SourceFile, SourceKind};

use crate::error::{BackendError, BackendFailure};
use crate::models::{RenderOutput, Resolution};

pub use dwg::OdaDwgBackend;
pub use dxf::DxfBackend;
pub use mesh_converter::MeshConverterBackend;
pub use step_points::StepPointsBackend;
pub use stl::StlBackend;

/// One way of rendering source files.
#[async_trait]
pub trait RenderBackend: Send + Sync + Debug {
    /// Stable identifier, e.g. `"dxf"` or `"mesh-converter:gmsh"`.
    fn id(&self) -> &str;

    /// The kind of source this backend renders.
    fn kind(&self) -> SourceKind;

    /// Whether files with this (lowercase) extension are handled.
    fn supports(&self, extension: &str) -> bool;

    /// Render `file` at `target`.
    ///
    /// Errors mean "try the next backend". A failure that happens after
    /// the model extents were computed carries them along.
    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure>;
}

/// File stem safe to hand to external tools.
pub(crate) fn staging_stem(filename: &str) -> String {
    let stem = std::path::Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned
    }
}

/// Run CPU-bound rendering on the blocking pool.
pub(crate) async fn run_blocking<F>(work: F) -> Result<RenderOutput, BackendFailure>
where
    F: FnOnce() -> Result<RenderOutput, BackendFailure> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(BackendError::from)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_stem() {
        assert_eq!(staging_stem("floor plan (rev 2).dwg"), "floor_plan__rev_2_");
        assert_eq!(staging_stem("bracket.step"), "bracket");
        assert_eq!(staging_stem(".dwg"), "_dwg");
        assert_eq!(staging_stem(""), "source");
    }

    #[tokio::test]
    async fn test_run_blocking_maps_panic() {
        let result = run_blocking(|| panic!("boom")).await;
        let failure = result.expect_err("panic");
        assert!(matches!(failure.error, BackendError::Panicked(_)));
    }
}
