//! Read side of stored thumbnails.

pub mod cache;
pub mod service;

pub use cache::PreviewCache;
pub use service::{PreviewService, Thumbnail};
