//! Start-up probe of which render backends can run.
//!
//! Probing happens once; the resulting [`Capabilities`] is immutable and
//! shared. Backends are never re-probed per render call.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use partview_core::config::renderer::{MeshConverterConfig, RendererConfig};
use partview_core::types::SourceKind;

use crate::backend::{
    DxfBackend, MeshConverterBackend, OdaDwgBackend, StepPointsBackend, StlBackend,
};
use crate::discovery::ToolDiscovery;

/// How to build an available backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSpec {
    /// Built-in DXF reader.
    Dxf,
    /// DWG through the ODA File Converter at `program`.
    OdaDwg {
        /// Located converter executable.
        program: PathBuf,
    },
    /// Built-in STL reader.
    Stl,
    /// Configured STL converter.
    MeshConverter {
        /// Converter name.
        name: String,
        /// Located executable.
        program: PathBuf,
        /// Argument template.
        args: Vec<String>,
        /// Accepted extensions.
        extensions: Vec<String>,
    },
    /// Built-in STEP point reader.
    StepPoints,
}

/// Probe outcome for one backend id.
#[derive(Debug, Clone, Serialize)]
pub struct BackendCapability {
    /// Backend id.
    pub id: String,
    /// Source kind it renders.
    pub kind: SourceKind,
    /// Present when the backend can run.
    #[serde(skip)]
    pub spec: Option<BackendSpec>,
    /// Where the tool was found, or why the backend is unavailable.
    pub detail: String,
}

impl BackendCapability {
    fn available(id: impl Into<String>, kind: SourceKind, spec: BackendSpec, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            spec: Some(spec),
            detail: detail.into(),
        }
    }

    fn unavailable(id: impl Into<String>, kind: SourceKind, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            spec: None,
            detail: detail.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.spec.is_some()
    }
}

/// Ordered probe results for every configured backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capabilities {
    backends: Vec<BackendCapability>,
}

impl Capabilities {
    /// Probe every backend named in `config.backend_order`.
    pub fn probe(config: &RendererConfig) -> Self {
        let mut backends = Vec::new();
        let mut seen = HashSet::new();

        for id in &config.backend_order {
            let probed = match id.as_str() {
                DxfBackend::ID => vec![BackendCapability::available(
                    DxfBackend::ID,
                    SourceKind::VectorDrawing,
                    BackendSpec::Dxf,
                    "built-in",
                )],
                OdaDwgBackend::ID => vec![probe_oda(config)],
                StlBackend::ID => vec![BackendCapability::available(
                    StlBackend::ID,
                    SourceKind::SolidModel,
                    BackendSpec::Stl,
                    "built-in",
                )],
                StepPointsBackend::ID => vec![BackendCapability::available(
                    StepPointsBackend::ID,
                    SourceKind::SolidModel,
                    BackendSpec::StepPoints,
                    "built-in",
                )],
                MeshConverterBackend::ID_PREFIX => {
                    config.mesh_converters.iter().map(probe_mesh_converter).collect()
                }
                other => match other.strip_prefix("mesh-converter:") {
                    Some(name) => match config.mesh_converters.iter().find(|c| c.name == name) {
                        Some(converter) => vec![probe_mesh_converter(converter)],
                        None => {
                            warn!(backend = %other, "No mesh converter configured with this name");
                            Vec::new()
                        }
                    },
                    None => {
                        warn!(backend = %other, "Unknown backend id in backend_order, ignoring");
                        Vec::new()
                    }
                },
            };

            for mut capability in probed {
                if !seen.insert(capability.id.clone()) {
                    continue;
                }
                if config.is_disabled(&capability.id) {
                    capability.spec = None;
                    capability.detail = "disabled by configuration".to_string();
                }
                backends.push(capability);
            }
        }

        let capabilities = Self { backends };
        info!(summary = %capabilities.summary(), "Render backends probed");
        capabilities
    }

    /// No backend available; every render produces a placeholder.
    pub fn none() -> Self {
        Self::default()
    }

    /// All probe results in attempt order.
    pub fn entries(&self) -> &[BackendCapability] {
        &self.backends
    }

    /// Specs of the available backends, in attempt order.
    pub fn available(&self) -> impl Iterator<Item = &BackendSpec> {
        self.backends.iter().filter_map(|b| b.spec.as_ref())
    }

    pub fn is_available(&self, id: &str) -> bool {
        self.backends
            .iter()
            .any(|b| b.id == id && b.is_available())
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        if self.backends.is_empty() {
            return "no backends configured".to_string();
        }
        self.backends
            .iter()
            .map(|b| {
                let state = if b.is_available() { "available" } else { "unavailable" };
                format!("{}={state} ({})", b.id, b.detail)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn probe_oda(config: &RendererConfig) -> BackendCapability {
    match ToolDiscovery::oda_file_converter().locate(&config.oda_converter_path) {
        Ok(location) => BackendCapability::available(
            OdaDwgBackend::ID,
            SourceKind::VectorDrawing,
            BackendSpec::OdaDwg {
                program: location.path.clone(),
            },
            format!("{} ({:?})", location.path.display(), location.method),
        ),
        Err(e) => BackendCapability::unavailable(OdaDwgBackend::ID, SourceKind::VectorDrawing, e.to_string()),
    }
}

fn probe_mesh_converter(converter: &MeshConverterConfig) -> BackendCapability {
    let id = MeshConverterBackend::id_for(&converter.name);
    let discovery = ToolDiscovery::command(&converter.command);
    let command = Path::new(&converter.command);
    // a command with a directory part is a path, not a PATH lookup
    let located = if command.components().count() > 1 {
        discovery.from_explicit_path(command)
    } else {
        discovery.locate(Path::new(""))
    };

    match located {
        Ok(location) => BackendCapability::available(
            id,
            SourceKind::SolidModel,
            BackendSpec::MeshConverter {
                name: converter.name.clone(),
                program: location.path.clone(),
                args: converter.args.clone(),
                extensions: converter.extensions.clone(),
            },
            location.path.display().to_string(),
        ),
        Err(e) => BackendCapability::unavailable(id, SourceKind::SolidModel, e.to_string()),
    }
}
