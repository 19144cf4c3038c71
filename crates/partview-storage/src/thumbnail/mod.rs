//! Thumbnail derivation.

pub mod deriver;

pub use deriver::{ThumbnailDeriver, ThumbnailImage, ThumbnailSet, fit_within};
