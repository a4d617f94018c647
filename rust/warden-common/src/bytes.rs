//! `0x`-prefixed hex encoding for byte strings.
//!
//! Every byte string that crosses the ledger or signing-network boundary is
//! rendered as lowercase hex with a `0x` prefix. This module provides the
//! [`HexBytes`] newtype for owned byte strings and the [`hex_array`] serde
//! adapter for fixed-width fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use thiserror::Error;

/// Errors produced while decoding hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// The input contained a non-hex character or had odd length.
    #[error("invalid hex: {0}")]
    Invalid(String),

    /// The decoded value had an unexpected length.
    #[error("expected {expected} bytes, got {actual}")]
    Length {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, with or without a `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, HexError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(digits).map_err(|error| HexError::Invalid(error.to_string()))
}

/// Decode a hex string into a fixed-width array.
pub fn decode_hex_array<const N: usize>(value: &str) -> Result<[u8; N], HexError> {
    let bytes = decode_hex(value)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| HexError::Length {
        expected: N,
        actual,
    })
}

/// An owned byte string that serializes as `0x`-prefixed hex.
///
/// # Example
///
/// ```rust
/// use warden_common::HexBytes;
///
/// let bytes = HexBytes::from(vec![0xde, 0xad]);
/// assert_eq!(bytes.to_string(), "0xdead");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    /// Get the inner bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Convert into the inner `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<HexBytes> for Vec<u8> {
    fn from(bytes: HexBytes) -> Self {
        bytes.0
    }
}

impl std::fmt::Display for HexBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl std::str::FromStr for HexBytes {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex(s).map(Self)
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hex(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        decode_hex(&value).map(Self).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for fixed-width byte arrays encoded as `0x`-hex.
///
/// Use with `#[serde(with = "warden_common::hex_array")]`.
pub mod hex_array {
    use super::{decode_hex_array, encode_hex};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-width array as `0x`-hex.
    pub fn serialize<S: Serializer, const N: usize>(
        value: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hex(value))
    }

    /// Deserialize a fixed-width array from `0x`-hex.
    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let value = String::deserialize(deserializer)?;
        decode_hex_array(&value).map_err(serde::de::Error::custom)
    }
}
