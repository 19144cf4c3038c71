//! # partview-transport
//!
//! Reverses the text encodings that binary part files pick up on their
//! way through the metadata store: hex behind a `\x` escape, bare hex,
//! base64, and base64 wrapped in hex.
//!
//! Decoding is a pure function of the stored value and its content hint.

pub mod decoder;
pub mod error;
pub mod layer;

pub use decoder::{DecodedAsset, TransportDecoder};
pub use error::{DecodeError, DecodeReason};
pub use layer::{TransportLayer, encode};
