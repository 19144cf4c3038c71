//! Built-in STEP backend drawing the model's cartesian points.

use async_trait::async_trait;

use partview_core::types::{SourceFile, SourceKind};

use super::{RenderBackend, run_blocking};
use crate::error::BackendFailure;
use crate::formats::step;
use crate::models::{RenderOutput, Resolution};
use crate::render::solid;

/// Renders a STEP file as a point cloud inside its bounding box.
///
/// Needs no external tool, so it is the last resort for STEP input
/// before the placeholder.
#[derive(Debug, Default, Clone)]
pub struct StepPointsBackend;

impl StepPointsBackend {
    pub const ID: &'static str = "step-points";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderBackend for StepPointsBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SolidModel
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "step" | "stp")
    }

    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure> {
        let data = file.bytes.clone();
        run_blocking(move || {
            let points = step::parse_points(&data)?;
            solid::render_points(&points, target)
        })
        .await
    }
}
