//! DWG backend via the ODA File Converter.
//!
//! The converter works on folders: the DWG is staged into `in/`, the tool
//! writes a DXF of the same stem into `out/`, and the DXF is rendered by
//! the built-in vector path.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use partview_core::types::{SourceFile, SourceKind};

use super::{RenderBackend, dxf::render_dxf, staging_stem};
use crate::error::{BackendError, BackendFailure};
use crate::executor::{JobDir, ProcessRunner};
use crate::models::{RenderOutput, Resolution};

/// DXF release written by the converter.
const OUTPUT_VERSION: &str = "ACAD2018";

/// Converts DWG to DXF with an external tool, then renders the DXF.
#[derive(Debug, Clone)]
pub struct OdaDwgBackend {
    program: PathBuf,
    runner: ProcessRunner,
}

impl OdaDwgBackend {
    pub const ID: &'static str = "oda-dwg";

    pub fn new(program: PathBuf, runner: ProcessRunner) -> Self {
        Self { program, runner }
    }

    async fn convert(&self, job: &JobDir, file: &SourceFile) -> Result<Bytes, BackendError> {
        let input_dir = job.subdir("in").await?;
        let output_dir = job.subdir("out").await?;
        let stem = staging_stem(&file.filename);
        let input_name = format!("{stem}.dwg");
        tokio::fs::write(input_dir.join(&input_name), &file.bytes).await?;

        // InputFolder OutputFolder Version Type Recurse Audit Filter
        let args = vec![
            input_dir.to_string_lossy().to_string(),
            output_dir.to_string_lossy().to_string(),
            OUTPUT_VERSION.to_string(),
            "DXF".to_string(),
            "0".to_string(),
            "1".to_string(),
            input_name,
        ];
        let output = self.runner.run(&self.program, &args).await?;
        debug!(stdout = %output.stdout.trim(), "ODA File Converter finished");

        let converted = output_dir.join(format!("{stem}.dxf"));
        if !tokio::fs::try_exists(&converted).await.unwrap_or(false) {
            return Err(BackendError::ToolOutputMissing { path: converted });
        }
        Ok(Bytes::from(tokio::fs::read(&converted).await?))
    }
}

#[async_trait]
impl RenderBackend for OdaDwgBackend {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::VectorDrawing
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "dwg"
    }

    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure> {
        let job = self.runner.create_job_dir().await.map_err(BackendError::from)?;
        let converted = self.convert(&job, file).await;
        job.cleanup().await;
        render_dxf(converted?, target).await
    }
}
