//! # partview-core
//!
//! Core crate for PartView. Contains the storage and metadata traits,
//! configuration schemas, typed identifiers, the part asset data model,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other PartView crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
