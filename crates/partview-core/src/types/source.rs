//! Source files attached to a part and the transport payloads they are
//! stored as.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One of the three source slots a part can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceSlot {
    /// 2D vector drawing.
    #[serde(rename = "2D")]
    Drawing2D,
    /// 3D solid model.
    #[serde(rename = "3D")]
    Model3D,
    /// User-supplied photograph.
    #[serde(rename = "USER")]
    User,
}

impl SourceSlot {
    /// All slots, in storage order.
    pub const ALL: [SourceSlot; 3] = [Self::Drawing2D, Self::Model3D, Self::User];

    /// Order used to pick a primary source when none is selected.
    pub const FALLBACK_ORDER: [SourceSlot; 3] = [Self::User, Self::Drawing2D, Self::Model3D];

    /// The persisted name of this slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drawing2D => "2D",
            Self::Model3D => "3D",
            Self::User => "USER",
        }
    }

    /// Lower-case form used in storage paths.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Drawing2D => "2d",
            Self::Model3D => "3d",
            Self::User => "user",
        }
    }

    /// The kind of file this slot holds.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Drawing2D => SourceKind::VectorDrawing,
            Self::Model3D => SourceKind::SolidModel,
            Self::User => SourceKind::Photograph,
        }
    }
}

impl fmt::Display for SourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSlot {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "2D" => Ok(Self::Drawing2D),
            "3D" => Ok(Self::Model3D),
            "USER" => Ok(Self::User),
            other => Err(AppError::validation(format!(
                "Unknown primary graphic source: {other}"
            ))),
        }
    }
}

/// What a source file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// DXF/DWG drawing.
    VectorDrawing,
    /// STEP/IGES/STL model.
    SolidModel,
    /// Raster image.
    Photograph,
}

impl SourceKind {
    /// Classify a file extension (without the dot, any case).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "dxf" | "dwg" => Some(Self::VectorDrawing),
            "step" | "stp" | "iges" | "igs" | "stl" => Some(Self::SolidModel),
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp" => {
                Some(Self::Photograph)
            }
            _ => None,
        }
    }
}

/// Content type for an extension, as recorded in the asset record.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "dxf" => "application/dxf",
        "dwg" => "application/acad",
        "step" | "stp" => "application/step",
        "iges" | "igs" => "model/iges",
        "stl" => "model/stl",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Split a filename into its lower-case extension, if any.
pub fn extension_of(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// A source file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// What the file contains.
    pub kind: SourceKind,
    /// Raw file contents.
    pub bytes: Bytes,
    /// Original file name, including extension.
    pub filename: String,
    /// Lower-case extension without the dot.
    pub extension: String,
    /// Size of `bytes`.
    pub size_bytes: u64,
}

impl SourceFile {
    /// Build a source file, classifying it by extension.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, AppError> {
        let filename = filename.into();
        let extension = extension_of(&filename);
        let kind = SourceKind::from_extension(&extension).ok_or_else(|| {
            AppError::validation(format!("Unsupported file type: {filename}"))
        })?;
        Ok(Self::with_kind(kind, filename, bytes))
    }

    /// Build a source file of a known kind.
    pub fn with_kind(kind: SourceKind, filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let bytes = bytes.into();
        Self {
            kind,
            extension: extension_of(&filename),
            size_bytes: bytes.len() as u64,
            filename,
            bytes,
        }
    }

    /// Content type derived from the extension.
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.extension)
    }
}

/// A value as returned by the metadata store, before transport decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// The store already returned binary.
    Bytes(Bytes),
    /// The store returned text that may carry encoding layers.
    Text(String),
}

impl RawValue {
    /// Whether the value holds no data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(b) => b.is_empty(),
            Self::Text(t) => t.is_empty(),
        }
    }
}

/// An opaque stored value plus an optional declared content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    /// The stored value.
    pub raw: RawValue,
    /// Declared content type, if the store recorded one.
    pub hint: Option<String>,
}

impl EncodedPayload {
    /// A payload holding text.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            raw: RawValue::Text(value.into()),
            hint: None,
        }
    }

    /// A payload holding raw bytes.
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self {
            raw: RawValue::Bytes(value.into()),
            hint: None,
        }
    }

    /// Attach a content type hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
