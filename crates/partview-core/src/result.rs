//! Convenience result type alias for PartView.

use crate::error::AppError;

/// A specialized `Result` type for PartView operations.
pub type AppResult<T> = Result<T, AppError>;
