//! # Quantity
//!
//! Unsigned integer of arbitrary precision. QUANTITY values decode from
//! hex into a big-endian magnitude and encode back to the shortest
//! even-length hex form.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hex::{decode_hex, encode_hex, HexError};

/// Non-negative integer held as a minimal big-endian magnitude.
///
/// The inner buffer never has leading zero bytes; zero is the empty buffer.
/// Construction always goes through [`Quantity::from_be_bytes`], which
/// enforces this, so equal numbers always have equal representations.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Quantity(Vec<u8>);

impl Quantity {
    pub fn zero() -> Self {
        Self(Vec::new())
    }

    /// Build from big-endian bytes, stripping leading zeros.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self(bytes[first..].to_vec())
    }

    /// Parse `0x`-prefixed (or bare) hex.
    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        Ok(Self::from_be_bytes(&decode_hex(text)?))
    }

    /// Minimal big-endian magnitude; empty for zero.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Shortest even-length hex form; zero encodes as `0x00`.
    pub fn to_hex(&self) -> String {
        if self.is_zero() {
            "0x00".to_string()
        } else {
            encode_hex(&self.0)
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn to_u128(&self) -> Option<u128> {
        if self.0.len() > 16 {
            return None;
        }
        Some(self.0.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }
}

impl From<u128> for Quantity {
    fn from(value: u128) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self.to_hex())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zeros_are_not_significant() {
        assert_eq!(Quantity::from_hex("0x0001").unwrap(), Quantity::from(1u64));
        assert_eq!(Quantity::from_hex("0x1").unwrap(), Quantity::from(1u64));
        assert_eq!(Quantity::from_hex("0x000").unwrap(), Quantity::zero());
    }

    #[test]
    fn encodes_shortest_even_length() {
        assert_eq!(Quantity::from(0u64).to_hex(), "0x00");
        assert_eq!(Quantity::from(1u64).to_hex(), "0x01");
        assert_eq!(Quantity::from(0x1234u64).to_hex(), "0x1234");
        assert_eq!(Quantity::from(0x10000u64).to_hex(), "0x010000");
    }

    #[test]
    fn holds_values_wider_than_u128() {
        let wide = Quantity::from_hex(&format!("0x01{}", "00".repeat(20))).unwrap();
        assert_eq!(wide.as_be_bytes().len(), 21);
        assert_eq!(wide.to_u128(), None);
        assert!(wide > Quantity::from(u128::MAX));
    }

    #[test]
    fn narrows_to_primitives() {
        let q = Quantity::from(u64::MAX);
        assert_eq!(q.to_u64(), Some(u64::MAX));
        assert_eq!(Quantity::from(u128::from(u64::MAX) + 1).to_u64(), None);
    }

    #[test]
    fn orders_numerically() {
        assert!(Quantity::from(256u64) > Quantity::from(2u64));
        assert!(Quantity::zero() < Quantity::from(1u64));
    }

    #[test]
    fn serde_uses_hex() {
        let q = Quantity::from(255u64);
        assert_eq!(serde_json::to_value(&q).unwrap(), serde_json::json!("0xff"));
        let back: Quantity = serde_json::from_value(serde_json::json!("0x00ff")).unwrap();
        assert_eq!(back, q);
    }
}
