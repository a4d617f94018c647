//! Uncompressed secp256k1 public keys.

use crate::{Address, KeyError};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use warden_common::{Keccak256Hash, decode_hex, encode_hex};

/// Length of an uncompressed SEC1 point (`0x04 ‖ x ‖ y`).
pub const PUBLIC_KEY_SIZE: usize = 65;

/// A secp256k1 public key, always held in uncompressed SEC1 form.
///
/// Compressed input is accepted and normalized, so two keys compare equal
/// whenever they name the same curve point.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Parse a SEC1-encoded point, compressed or uncompressed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidPublicKey`] if the bytes are not a point on
    /// the curve.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::from(&key))
    }

    /// The 65 uncompressed bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// The ledger address controlled by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Keccak-256 over the uncompressed encoding, the basis of the ledger's
    /// token id for this key.
    pub fn keccak256(&self) -> Keccak256Hash {
        Keccak256Hash::hash(&self.0)
    }
}

impl From<&k256::PublicKey> for PublicKey {
    fn from(key: &k256::PublicKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }
}

impl From<&k256::ecdsa::VerifyingKey> for PublicKey {
    fn from(key: &k256::ecdsa::VerifyingKey) -> Self {
        Self::from(&k256::PublicKey::from(key))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Self::from_sec1_bytes(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
