//! Error types for the rendering subsystem.
//!
//! Backend errors never escape [`crate::CadRenderer::render`]; they are
//! recorded as failed attempts and the next backend is tried. They map
//! into `partview_core::error::AppError` for callers that drive a
//! backend directly.

use partview_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

use crate::executor::ProcessError;
use crate::models::BoundingBox;

/// Why a single backend could not render a file.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend does not handle this file extension.
    #[error("Extension '{extension}' is not handled by this backend")]
    Unsupported {
        /// The rejected extension.
        extension: String,
    },

    /// The input could not be parsed.
    #[error("Cannot parse {format} data: {reason}")]
    Parse {
        /// Format being parsed, e.g. "DXF".
        format: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The file parsed but holds nothing drawable.
    #[error("No renderable geometry in {format} data")]
    NoGeometry {
        /// Format that was parsed.
        format: &'static str,
    },

    /// Geometry collapses to a point or line in the chosen view.
    #[error("Geometry projects to a degenerate image")]
    DegenerateProjection,

    /// An external tool failed.
    #[error("External tool failed: {0}")]
    Process(#[from] ProcessError),

    /// The external tool ran but did not produce its output file.
    #[error("Tool output not created: {path}")]
    ToolOutputMissing {
        /// Expected output path.
        path: PathBuf,
    },

    /// Raster encoding failed.
    #[error("Raster encoding failed: {0}")]
    Encode(String),

    /// Filesystem error while staging files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking render task did not complete.
    #[error("Render task failed: {0}")]
    Task(String),

    /// The backend panicked.
    #[error("Backend panicked: {0}")]
    Panicked(String),
}

impl BackendError {
    pub(crate) fn parse(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            format,
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Self::Panicked(err.to_string())
        } else {
            Self::Task(err.to_string())
        }
    }
}

impl From<image::ImageError> for BackendError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err.to_string())
    }
}

/// A backend failure plus whatever model extents were known before it.
#[derive(Debug)]
pub struct BackendFailure {
    /// What went wrong.
    pub error: BackendError,
    /// Extents computed before the failure, shown on the placeholder.
    pub salvaged_bbox: Option<BoundingBox>,
}

impl BackendFailure {
    /// A failure that happened after the extents were known.
    pub fn salvaged(error: impl Into<BackendError>, bbox: BoundingBox) -> Self {
        Self {
            error: error.into(),
            salvaged_bbox: Some(bbox),
        }
    }
}

impl From<BackendError> for BackendFailure {
    fn from(error: BackendError) -> Self {
        Self {
            error,
            salvaged_bbox: None,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        let kind = match &err {
            BackendError::Process(_) | BackendError::ToolOutputMissing { .. } => {
                ErrorKind::ExternalService
            }
            BackendError::Unsupported { .. } => ErrorKind::Validation,
            _ => ErrorKind::Render,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
