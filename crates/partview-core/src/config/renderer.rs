//! Rendering backend configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration for the CAD rendering subsystem.
///
/// External tools are located once at start-up. An empty path means
/// "discover it": common install locations first, then `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RendererConfig {
    /// Backend ids in the order they are attempted.
    ///
    /// A `mesh-converter` entry expands to every configured converter.
    #[serde(default = "default_backend_order")]
    pub backend_order: Vec<String>,

    /// Backend ids that are never used, even if available.
    #[serde(default)]
    pub disabled_backends: Vec<String>,

    /// Root directory for per-attempt working directories.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,

    /// Timeout in seconds for a single external process.
    #[serde(default = "default_process_timeout_seconds")]
    #[validate(range(min = 1, max = 600))]
    pub process_timeout_seconds: u64,

    /// Global limit on concurrently running external processes.
    #[serde(default = "default_max_concurrent_processes")]
    #[validate(range(min = 1, max = 16))]
    pub max_concurrent_processes: usize,

    /// Path to the ODA File Converter executable used for DWG input.
    #[serde(default)]
    pub oda_converter_path: PathBuf,

    /// External tools that convert solid models to STL.
    #[serde(default = "default_mesh_converters")]
    #[validate(nested)]
    pub mesh_converters: Vec<MeshConverterConfig>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend_order: default_backend_order(),
            disabled_backends: Vec::new(),
            temp_root: None,
            process_timeout_seconds: default_process_timeout_seconds(),
            max_concurrent_processes: default_max_concurrent_processes(),
            oda_converter_path: PathBuf::new(),
            mesh_converters: default_mesh_converters(),
        }
    }
}

impl RendererConfig {
    /// Resolve the effective temp root directory.
    pub fn effective_temp_root(&self) -> PathBuf {
        self.temp_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("partview"))
    }

    /// Whether a backend id has been switched off.
    pub fn is_disabled(&self, backend_id: &str) -> bool {
        self.disabled_backends.iter().any(|d| {
            d == backend_id || (d == "mesh-converter" && backend_id.starts_with("mesh-converter:"))
        })
    }
}

/// An external tool that turns a solid model into an STL mesh.
///
/// `args` may contain the placeholders `{input}`, `{output}`,
/// `{input_dir}` and `{output_dir}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MeshConverterConfig {
    /// Short name, used in the backend id `mesh-converter:<name>`.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Executable name or absolute path.
    #[validate(length(min = 1))]
    pub command: String,
    /// Argument template.
    #[serde(default)]
    pub args: Vec<String>,
    /// Lower-case file extensions (without the dot) this tool accepts.
    #[serde(default = "default_solid_extensions")]
    pub extensions: Vec<String>,
}

fn default_backend_order() -> Vec<String> {
    ["dxf", "oda-dwg", "stl", "mesh-converter", "step-points"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_process_timeout_seconds() -> u64 {
    30
}

fn default_max_concurrent_processes() -> usize {
    2
}

fn default_solid_extensions() -> Vec<String> {
    ["step", "stp", "iges", "igs"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_mesh_converters() -> Vec<MeshConverterConfig> {
    vec![MeshConverterConfig {
        name: "gmsh".to_string(),
        command: "gmsh".to_string(),
        args: ["{input}", "-2", "-format", "stl", "-o", "{output}"]
            .into_iter()
            .map(String::from)
            .collect(),
        extensions: default_solid_extensions(),
    }]
}
