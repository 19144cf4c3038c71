//! Encoding layers and their inverse.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use partview_core::types::RawValue;
use serde::{Deserialize, Serialize};

/// The two-character marker some stores prefix hex-escaped binary with.
pub const HEX_MARKER: &str = "\\x";

/// One text encoding layer, with enough detail to re-apply it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum TransportLayer {
    /// Hexadecimal digits, optionally behind the `\x` marker.
    Hex {
        /// Whether the `\x` marker was present.
        marker: bool,
        /// Whether the digits used `A-F` rather than `a-f`.
        uppercase: bool,
    },
    /// Standard-alphabet base64.
    Base64 {
        /// Whether `=` padding was present.
        padded: bool,
    },
}

impl TransportLayer {
    /// The transformation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hex { .. } => "hex",
            Self::Base64 { .. } => "base64",
        }
    }

    fn apply(&self, data: &[u8]) -> String {
        match *self {
            Self::Hex { marker, uppercase } => {
                let digits = if uppercase {
                    hex::encode_upper(data)
                } else {
                    hex::encode(data)
                };
                if marker {
                    format!("{HEX_MARKER}{digits}")
                } else {
                    digits
                }
            }
            Self::Base64 { padded: true } => STANDARD.encode(data),
            Self::Base64 { padded: false } => STANDARD_NO_PAD.encode(data),
        }
    }
}

/// Re-apply `layers` (outermost first, as reported by the decoder) to
/// `bytes`.
///
/// For any value the decoder accepted with single-case hex digits this
/// reproduces the stored value exactly.
pub fn encode(bytes: &[u8], layers: &[TransportLayer]) -> RawValue {
    let mut current: Option<String> = None;
    for layer in layers.iter().rev() {
        let input = current.as_deref().map(str::as_bytes).unwrap_or(bytes);
        current = Some(layer.apply(input));
    }
    match current {
        Some(text) => RawValue::Text(text),
        None => RawValue::Bytes(bytes::Bytes::copy_from_slice(bytes)),
    }
}
