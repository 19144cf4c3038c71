//! File information for CAD sources.
//!
//! Lists what a drawing contains without rendering it: header version,
//! layers, per-type entity counts and the drawing extents.

use std::collections::BTreeMap;

use serde::Serialize;

use partview_core::types::{SourceFile, SourceKind};

use crate::formats::dxf;
use crate::render::vector;

/// What is known about one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CadInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: SourceKind,
    /// Contents of a DXF drawing; `None` for other formats or when the
    /// drawing could not be read.
    pub dxf: Option<DxfInfo>,
    /// Why the drawing could not be read.
    pub error: Option<String>,
}

/// Contents of a DXF drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DxfInfo {
    /// `$ACADVER`, e.g. `AC1015`.
    pub version: Option<String>,
    pub layers: Vec<String>,
    /// Entities of the `ENTITIES` section per type, including the ones
    /// that are not drawn.
    pub entity_counts: BTreeMap<String, usize>,
    pub total_entities: usize,
    /// `None` when nothing drawable was found.
    pub extents: Option<DrawingExtents>,
}

/// Axis-aligned extents in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawingExtents {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CadInfo {
    /// Inspect `file`. Parsing runs on the calling thread.
    pub fn inspect(file: &SourceFile) -> Self {
        let mut info = Self {
            file_name: file.filename.clone(),
            size_bytes: file.size_bytes,
            kind: file.kind,
            dxf: None,
            error: None,
        };
        if file.extension == "dxf" {
            match dxf::parse(&file.bytes) {
                Ok(drawing) => info.dxf = Some(DxfInfo::from_drawing(&drawing)),
                Err(e) => info.error = Some(e.to_string()),
            }
        }
        info
    }
}

impl DxfInfo {
    /// Summarize a parsed drawing.
    pub fn from_drawing(drawing: &dxf::Drawing) -> Self {
        let extents = vector::bounds(&drawing.tessellate()).map(|(min, max)| DrawingExtents {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
            width: max.x - min.x,
            height: max.y - min.y,
        });
        Self {
            version: drawing.version.clone(),
            layers: drawing.layers.clone(),
            entity_counts: drawing.entity_counts.clone(),
            total_entities: drawing.entity_counts.values().sum(),
            extents,
        }
    }
}
