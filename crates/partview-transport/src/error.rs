//! Decode failures.

use partview_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeReason {
    /// The payload, or what it decoded to, holds no bytes.
    #[error("payload is empty")]
    Empty,
    /// Hex digits were expected but could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    /// The text looked like base64 but did not decode.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    /// No known encoding matched.
    #[error("unrecognized encoding")]
    Unrecognized,
}

/// A field-scoped decode failure.
///
/// Callers treat this as non-fatal: the slot stays empty and the rest of
/// the save proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode field '{field}': {reason}")]
pub struct DecodeError {
    /// The metadata field the payload came from.
    pub field: String,
    /// What went wrong.
    pub reason: DecodeReason,
}

impl DecodeError {
    pub(crate) fn new(field: &str, reason: DecodeReason) -> Self {
        Self {
            field: field.to_string(),
            reason,
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::with_source(ErrorKind::Decode, err.to_string(), err)
    }
}
