//! Layer sniffing.
//!
//! Sniffing order, most specific first:
//!
//! 1. raw bytes pass through untouched;
//! 2. `\x` followed only by hex digits is hex behind the escape marker;
//! 3. even-length text made only of hex digits is bare hex;
//! 4. anything else must be standard base64, padding optional.
//!
//! After a hex layer, output that is itself well-formed base64 text is
//! unwrapped once more unless the payload hint declares a textual type.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use partview_core::types::{EncodedPayload, RawValue};
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeReason};
use crate::layer::{HEX_MARKER, TransportLayer};

const TOLERANT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Bytes recovered from a payload plus the layers that were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    /// The decoded binary.
    pub bytes: Bytes,
    /// Layers in the order they were peeled off, outermost first.
    pub layers: Vec<TransportLayer>,
    /// Set when a nested base64 layer was unwrapped on content alone,
    /// with no hint to confirm it.
    pub ambiguous: bool,
}

impl DecodedAsset {
    /// The transformation names, outermost first.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(TransportLayer::name).collect()
    }
}

/// Normalizes stored values back into raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportDecoder;

impl TransportDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode a payload read from `field`.
    pub fn decode(&self, field: &str, payload: &EncodedPayload) -> Result<DecodedAsset, DecodeError> {
        let text = match &payload.raw {
            RawValue::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(DecodeError::new(field, DecodeReason::Empty));
                }
                return Ok(DecodedAsset {
                    bytes: bytes.clone(),
                    layers: Vec::new(),
                    ambiguous: false,
                });
            }
            RawValue::Text(text) => text.as_str(),
        };

        if text.is_empty() {
            return Err(DecodeError::new(field, DecodeReason::Empty));
        }

        let decoded = if let Some(digits) = text.strip_prefix(HEX_MARKER) {
            self.decode_hex(field, digits, true, payload.hint.as_deref())?
        } else if is_hex_text(text) && text.len() % 2 == 0 {
            self.decode_hex(field, text, false, payload.hint.as_deref())?
        } else if is_base64_text(text.as_bytes()) {
            let bytes = TOLERANT_BASE64
                .decode(text)
                .map_err(|e| DecodeError::new(field, DecodeReason::InvalidBase64(e.to_string())))?;
            DecodedAsset {
                bytes: Bytes::from(bytes),
                layers: vec![TransportLayer::Base64 {
                    padded: text.ends_with('='),
                }],
                ambiguous: false,
            }
        } else {
            return Err(DecodeError::new(field, DecodeReason::Unrecognized));
        };

        if decoded.bytes.is_empty() {
            return Err(DecodeError::new(field, DecodeReason::Empty));
        }

        debug!(
            field,
            bytes = decoded.bytes.len(),
            layers = ?decoded.layer_names(),
            "Decoded transport payload"
        );
        Ok(decoded)
    }

    fn decode_hex(
        &self,
        field: &str,
        digits: &str,
        marker: bool,
        hint: Option<&str>,
    ) -> Result<DecodedAsset, DecodeError> {
        if digits.is_empty() {
            return Err(DecodeError::new(field, DecodeReason::Empty));
        }
        if !is_hex_text(digits) {
            return Err(DecodeError::new(
                field,
                DecodeReason::InvalidHex("escape marker followed by non-hex data".to_string()),
            ));
        }
        let bytes = hex::decode(digits)
            .map_err(|e| DecodeError::new(field, DecodeReason::InvalidHex(e.to_string())))?;

        let hex_layer = TransportLayer::Hex {
            marker,
            uppercase: digits.bytes().any(|b| b.is_ascii_uppercase()),
        };

        if hint.is_some_and(is_textual_hint) || !is_base64_text(&bytes) {
            return Ok(DecodedAsset {
                bytes: Bytes::from(bytes),
                layers: vec![hex_layer],
                ambiguous: false,
            });
        }

        match TOLERANT_BASE64.decode(&bytes) {
            Ok(inner) if !inner.is_empty() => {
                let ambiguous = hint.is_none();
                if ambiguous {
                    warn!(
                        field,
                        "Hex payload is itself base64 text; unwrapping nested layer without a content hint"
                    );
                }
                Ok(DecodedAsset {
                    layers: vec![
                        hex_layer,
                        TransportLayer::Base64 {
                            padded: bytes.last() == Some(&b'='),
                        },
                    ],
                    bytes: Bytes::from(inner),
                    ambiguous,
                })
            }
            _ => Ok(DecodedAsset {
                bytes: Bytes::from(bytes),
                layers: vec![hex_layer],
                ambiguous: false,
            }),
        }
    }
}

fn is_hex_text(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Whether `data` has the shape of standard base64: alphabet characters,
/// at most two trailing `=`, and a length that can decode.
fn is_base64_text(data: &[u8]) -> bool {
    let body_len = data
        .iter()
        .rev()
        .take(2)
        .take_while(|&&b| b == b'=')
        .count();
    let (body, padding) = data.split_at(data.len() - body_len);
    if body.is_empty() || body.len() % 4 == 1 {
        return false;
    }
    if !padding.is_empty() && data.len() % 4 != 0 {
        return false;
    }
    body.iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

fn is_textual_hint(hint: &str) -> bool {
    let hint = hint.trim().to_ascii_lowercase();
    hint.starts_with("text/")
        || hint == "application/json"
        || hint == "application/xml"
        || hint.ends_with("+json")
        || hint.ends_with("+xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::encode;
    use base64::engine::general_purpose::STANDARD;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn decode_text(text: &str) -> Result<DecodedAsset, DecodeError> {
        TransportDecoder::new().decode("drawing_data", &EncodedPayload::text(text))
    }

    #[test]
    fn test_escaped_hex_of_base64() {
        let stored = format!("\\x{}", hex::encode("aGVsbG8="));
        let decoded = decode_text(&stored).expect("decode");
        assert_eq!(decoded.bytes.as_ref(), b"hello");
        assert_eq!(decoded.layer_names(), vec!["hex", "base64"]);
        assert!(decoded.ambiguous);
    }

    #[test]
    fn test_labeled_sniffing_set() {
        let decoder = TransportDecoder::new();
        let b64 = STANDARD.encode(PNG_SIGNATURE);
        let fixtures: Vec<(EncodedPayload, Vec<&str>)> = vec![
            (EncodedPayload::bytes(PNG_SIGNATURE.to_vec()), vec![]),
            (EncodedPayload::text(hex::encode(PNG_SIGNATURE)), vec!["hex"]),
            (
                EncodedPayload::text(format!("\\x{}", hex::encode_upper(PNG_SIGNATURE))),
                vec!["hex"],
            ),
            (EncodedPayload::text(b64.clone()), vec!["base64"]),
            (
                EncodedPayload::text(b64.trim_end_matches('=').to_string()),
                vec!["base64"],
            ),
            (
                EncodedPayload::text(format!("\\x{}", hex::encode(&b64))),
                vec!["hex", "base64"],
            ),
            (EncodedPayload::text(hex::encode(&b64)), vec!["hex", "base64"]),
        ];

        for (payload, expected) in fixtures {
            let decoded = decoder.decode("f", &payload).expect("decode");
            assert_eq!(decoded.layer_names(), expected, "payload {payload:?}");
            assert_eq!(decoded.bytes.as_ref(), PNG_SIGNATURE, "payload {payload:?}");
        }
    }

    #[test]
    fn test_reencoding_reproduces_stored_value() {
        let decoder = TransportDecoder::new();
        let b64 = STANDARD.encode(PNG_SIGNATURE);
        let stored = [
            format!("\\x{}", hex::encode(&b64)),
            format!("\\x{}", hex::encode_upper(PNG_SIGNATURE)),
            hex::encode(PNG_SIGNATURE),
            b64.clone(),
            b64.trim_end_matches('=').to_string(),
        ];
        for text in stored {
            let decoded = decoder
                .decode("f", &EncodedPayload::text(text.clone()))
                .expect("decode");
            assert_eq!(encode(&decoded.bytes, &decoded.layers), RawValue::Text(text));
        }
    }

    #[test]
    fn test_hex_takes_precedence_over_base64() {
        // "deadbeef" is valid base64 as well
        let decoded = decode_text("deadbeef").expect("decode");
        assert_eq!(decoded.layer_names(), vec!["hex"]);
        assert_eq!(decoded.bytes.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_textual_hint_keeps_hex_result() {
        let payload = EncodedPayload::text(hex::encode("aGVsbG8=")).with_hint("text/plain");
        let decoded = TransportDecoder::new().decode("notes", &payload).expect("decode");
        assert_eq!(decoded.bytes.as_ref(), b"aGVsbG8=");
        assert_eq!(decoded.layer_names(), vec!["hex"]);
        assert!(!decoded.ambiguous);
    }

    #[test]
    fn test_binary_hint_confirms_nested_layer() {
        let payload =
            EncodedPayload::text(format!("\\x{}", hex::encode("aGVsbG8="))).with_hint("image/png");
        let decoded = TransportDecoder::new().decode("img", &payload).expect("decode");
        assert_eq!(decoded.bytes.as_ref(), b"hello");
        assert!(!decoded.ambiguous);
    }

    #[test]
    fn test_malformed_inputs_fail_with_field() {
        let err = decode_text("\\x123").expect_err("odd hex");
        assert_eq!(err.field, "drawing_data");
        assert!(matches!(err.reason, DecodeReason::InvalidHex(_)));

        let err = decode_text("\\xZZ").expect_err("non-hex after marker");
        assert!(matches!(err.reason, DecodeReason::InvalidHex(_)));

        let err = decode_text("not base64!").expect_err("garbage");
        assert_eq!(err.reason, DecodeReason::Unrecognized);

        let err = decode_text("").expect_err("empty");
        assert_eq!(err.reason, DecodeReason::Empty);

        let err = decode_text("\\x").expect_err("marker only");
        assert_eq!(err.reason, DecodeReason::Empty);
    }

    #[test]
    fn test_base64_shape_check() {
        assert!(is_base64_text(b"aGVsbG8="));
        assert!(is_base64_text(b"aGVsbG8"));
        assert!(!is_base64_text(b"aGVsb"));
        assert!(!is_base64_text(b"aGVsbG8=="));
        assert!(!is_base64_text(b"===="));
        assert!(!is_base64_text(&[0x89, b'P']));
    }
}
