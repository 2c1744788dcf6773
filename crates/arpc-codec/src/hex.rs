//! # Hex Encoding
//!
//! DATA and QUANTITY travel as `0x`-prefixed hex strings. Decoding is
//! lenient about the prefix and about odd digit counts (`0x1` is one
//! byte, `0x01`). Encoding is always `0x` plus lowercase digits.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },
}

/// Decode a hex string, with or without the `0x` prefix.
///
/// An odd number of digits is left-padded with one `0`.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let padded: Cow<'_, str> = if digits.len() % 2 == 1 {
        Cow::Owned(format!("0{digits}"))
    } else {
        Cow::Borrowed(digits)
    };
    let offset = padded.len() - digits.len();

    padded
        .as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let hi = nibble(pair[0], (2 * i).saturating_sub(offset))?;
            let lo = nibble(pair[1], 2 * i + 1 - offset)?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn nibble(c: u8, position: usize) -> Result<u8, HexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HexError::InvalidDigit {
            digit: char::from(c),
            position,
        }),
    }
}

/// Encode bytes as `0x` followed by lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push(char::from(DIGITS[usize::from(b >> 4)]));
        out.push(char::from(DIGITS[usize::from(b & 0x0f)]));
    }
    out
}

/// Serde adapter for byte buffers carried as DATA strings.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Seal {
///     #[serde(with = "arpc_codec::hex::serde_data")]
///     signature: Vec<u8>,
/// }
/// ```
pub mod serde_data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_hex(&text).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Encoded bytes always decode back to the same bytes.
        #[test]
        fn encode_then_decode_is_identity(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(decode_hex(&encode_hex(&bytes)).unwrap(), bytes);
        }

        /// Decoding is case-insensitive.
        #[test]
        fn decoding_ignores_case(digits in "[0-9a-f]{0,40}") {
            prop_assert_eq!(decode_hex(&digits).unwrap(), decode_hex(&digits.to_uppercase()).unwrap());
        }

        /// An odd number of digits decodes as if a leading zero nibble were present.
        #[test]
        fn odd_length_is_left_padded(digits in "[0-9a-f]([0-9a-f]{2}){0,20}") {
            prop_assert_eq!(
                decode_hex(&format!("0x{digits}")).unwrap(),
                decode_hex(&format!("0x0{digits}")).unwrap()
            );
        }

        /// Canonical DATA text survives decode then encode unchanged.
        #[test]
        fn canonical_text_is_stable(text in "0x([0-9a-f]{2}){0,40}") {
            prop_assert_eq!(encode_hex(&decode_hex(&text).unwrap()), text);
        }

        /// Arbitrary input never panics.
        #[test]
        fn decode_never_panics(input in ".{0,40}") {
            let _ = decode_hex(&input);
        }
    }
}
