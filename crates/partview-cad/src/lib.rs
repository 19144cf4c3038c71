//! # PartView CAD Renderer
//!
//! Turns 2D drawings and 3D models into raster previews.
//!
//! ## Backends
//!
//! Rendering is delegated to an ordered list of [`backend::RenderBackend`]
//! strategies. Built-in backends read DXF, STL and the point geometry of
//! STEP files; external tools (the ODA File Converter for DWG and any
//! configured mesh converter) extend the list when they are found at
//! start-up by [`Capabilities::probe`].
//!
//! ## Inspection
//!
//! [`CadRenderer::inspect`] reports a drawing's version, layers, entity
//! counts and extents without rendering it.
//!
//! ## Fallback
//!
//! [`CadRenderer::render`] never fails. When no backend can render a
//! file, an informative placeholder showing the file name and size is
//! returned with `degraded = true`.

pub mod backend;
pub mod capabilities;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod formats;
pub mod info;
pub mod metrics;
pub mod models;
pub mod render;
pub mod renderer;

pub use capabilities::{BackendCapability, BackendSpec, Capabilities};
pub use error::{BackendError, BackendFailure};
pub use info::{CadInfo, DrawingExtents, DxfInfo};
pub use metrics::{RenderMetrics, RenderMetricsSnapshot};
pub use models::{BackendAttempt, BoundingBox, RenderResult, Resolution};
pub use renderer::{CadRenderer, PLACEHOLDER_BACKEND};
