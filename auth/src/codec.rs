//! Binary codec for wire challenge data.
//!
//! The backend transports credential challenges and responses as URL-safe,
//! unpadded base64 text, while the platform credential API consumes and
//! produces raw byte buffers. This module is the single place where that
//! transcoding happens, for both registration and authentication ceremonies.
//!
//! Pure functions, no I/O, no dependency on any other auth component.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// A wire payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input contained characters outside the URL-safe alphabet or had
    /// an impossible length.
    #[error("invalid base64url payload: {0}")]
    Invalid(#[from] base64::DecodeError),
}

/// Encode a byte buffer as URL-safe, unpadded base64 text.
///
/// Deterministic and reversible: `decode(&encode(b))` always yields `b`.
///
/// # Example
///
/// ```
/// use divvy_auth::codec;
///
/// assert_eq!(codec::encode(b"divvy"), "ZGl2dnk");
/// ```
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 text into a byte buffer.
///
/// Unpadded input is the expected form; trailing `=` padding is tolerated
/// because some backends emit it.
///
/// # Errors
///
/// Returns [`CodecError`] if the input contains characters outside the
/// URL-safe alphabet or its length is impossible for base64.
///
/// # Example
///
/// ```
/// use divvy_auth::codec;
///
/// assert_eq!(codec::decode("ZGl2dnk").unwrap(), b"divvy");
/// assert!(codec::decode("not base64!").is_err());
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let unpadded = text.trim_end_matches('=');
    Ok(URL_SAFE_NO_PAD.decode(unpadded)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test assertions

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_without_padding() {
        // Lengths 1..=3 cover all padding cases of standard base64
        assert_eq!(encode(b"a"), "YQ");
        assert_eq!(encode(b"ab"), "YWI");
        assert_eq!(encode(b"abc"), "YWJj");
    }

    #[test]
    fn uses_url_safe_alphabet() {
        // 0xfb 0xff encodes to "+/" in the standard alphabet
        assert_eq!(encode(&[0xfb, 0xff]), "-_8");
    }

    #[test]
    fn decode_tolerates_padding() {
        assert_eq!(decode("YQ==").unwrap(), b"a");
        assert_eq!(decode("YWI=").unwrap(), b"ab");
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        assert!(decode("YQ!").is_err());
        assert!(decode("YW+j").is_err());
    }

    #[test]
    fn decode_rejects_impossible_length() {
        // A single base64 character cannot encode any byte sequence
        assert!(decode("Y").is_err());
    }

    #[test]
    fn decode_empty_is_empty() {
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn round_trips_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }

        #[test]
        fn round_trips_well_formed_text(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            // Every well-formed unpadded text is the encoding of some buffer
            let text = encode(&bytes);
            prop_assert_eq!(encode(&decode(&text).unwrap()), text);
        }
    }
}
