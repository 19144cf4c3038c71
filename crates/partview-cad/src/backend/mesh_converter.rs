//! Solid-model backend driven by a configured mesh converter.
//!
//! The tool converts the staged source into STL, which is then shaded by
//! the built-in STL path. Any command line works as long as it honours
//! the `{input}` and `{output}` placeholders.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use partview_core::types::{SourceFile, SourceKind};

use super::{RenderBackend, staging_stem, stl::render_stl};
use crate::error::{BackendError, BackendFailure};
use crate::executor::{JobDir, ProcessRunner};
use crate::models::{RenderOutput, Resolution};

/// A configured external converter producing STL.
#[derive(Debug, Clone)]
pub struct MeshConverterBackend {
    id: String,
    program: PathBuf,
    args: Vec<String>,
    extensions: Vec<String>,
    runner: ProcessRunner,
}

impl MeshConverterBackend {
    /// Id prefix shared by every converter entry.
    pub const ID_PREFIX: &'static str = "mesh-converter";

    pub fn new(
        name: &str,
        program: PathBuf,
        args: Vec<String>,
        extensions: &[String],
        runner: ProcessRunner,
    ) -> Self {
        Self {
            id: Self::id_for(name),
            program,
            args,
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            runner,
        }
    }

    /// Backend id for a converter called `name`.
    pub fn id_for(name: &str) -> String {
        format!("{}:{name}", Self::ID_PREFIX)
    }

    async fn convert(&self, job: &JobDir, file: &SourceFile) -> Result<Bytes, BackendError> {
        let stem = staging_stem(&file.filename);
        let input = job.subdir("in").await?.join(format!("{stem}.{}", file.extension));
        let output = job.subdir("out").await?.join(format!("{stem}.stl"));
        tokio::fs::write(&input, &file.bytes).await?;

        let args = ProcessRunner::substitute_args(&self.args, &input, &output);
        let result = self.runner.run(&self.program, &args).await?;
        debug!(backend = %self.id, duration_ms = result.duration.as_millis() as u64, "Mesh conversion finished");

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(BackendError::ToolOutputMissing { path: output });
        }
        Ok(Bytes::from(tokio::fs::read(&output).await?))
    }
}

#[async_trait]
impl RenderBackend for MeshConverterBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SolidModel
    }

    fn supports(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    async fn try_render(
        &self,
        file: &SourceFile,
        target: Resolution,
    ) -> Result<RenderOutput, BackendFailure> {
        let job = self.runner.create_job_dir().await.map_err(BackendError::from)?;
        let converted = self.convert(&job, file).await;
        job.cleanup().await;
        render_stl(converted?, target).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::formats::stl::fixtures;
    use partview_core::config::renderer::RendererConfig;

    fn runner(temp: &std::path::Path) -> ProcessRunner {
        ProcessRunner::new(&RendererConfig {
            temp_root: Some(temp.join("scratch")),
            process_timeout_seconds: 5,
            ..Default::default()
        })
    }

    fn shell_converter(script: &str, runner: ProcessRunner) -> MeshConverterBackend {
        MeshConverterBackend::new(
            "sh",
            PathBuf::from("sh"),
            vec![
                "-c".to_string(),
                script.to_string(),
                "sh".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            &["STEP".to_string(), "igs".to_string()],
            runner,
        )
    }

    #[tokio::test]
    async fn test_converted_mesh_is_rendered() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mesh_path = temp.path().join("box.stl");
        std::fs::write(&mesh_path, fixtures::binary_box([4.0, 2.0, 1.0])).expect("write");

        let script = format!("cp '{}' \"$2\"", mesh_path.display());
        let backend = shell_converter(&script, runner(temp.path()));
        assert_eq!(backend.id(), "mesh-converter:sh");
        assert!(backend.supports("step"));
        assert!(!backend.supports("stl"));

        let file = SourceFile::new("bracket.step", b"ISO-10303-21;".to_vec()).expect("source");
        let output = backend
            .try_render(&file, Resolution::new(160, 120))
            .await
            .expect("render");
        let bbox = output.bounding_box.expect("bbox");
        assert!((bbox.width - 4.0).abs() < 1e-6);

        let scratch = std::fs::read_dir(temp.path().join("scratch").join("render"))
            .map(|d| d.count())
            .unwrap_or(0);
        assert_eq!(scratch, 0);
    }

    #[tokio::test]
    async fn test_tool_without_output_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let backend = shell_converter("exit 0", runner(temp.path()));
        let file = SourceFile::new("part.igs", vec![1u8; 16]).expect("source");
        let failure = backend
            .try_render(&file, Resolution::new(100, 100))
            .await
            .expect_err("no output");
        assert!(matches!(failure.error, BackendError::ToolOutputMissing { .. }));
    }
}
