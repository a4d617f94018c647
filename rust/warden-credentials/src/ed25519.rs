//! Ed25519 keys, as used by wrapped keys on Solana-style networks.
//!
//! Public keys and signatures render as base58, the form those networks use
//! for addresses and transaction signatures.

use crate::KeyError;
use base58::{FromBase58, ToBase58};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an Ed25519 public key.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Length of an Ed25519 signature.
pub const ED25519_SIGNATURE_SIZE: usize = 64;

fn decode_base58<const N: usize>(value: &str) -> Result<[u8; N], String> {
    let bytes = value
        .from_base58()
        .map_err(|error| format!("invalid base58: {error:?}"))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected {N} bytes, got {}", bytes.len()))
}

/// The public half of an Ed25519 key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; ED25519_PUBLIC_KEY_SIZE]);

impl Ed25519PublicKey {
    /// Wrap raw key bytes after checking they decode to a curve point.
    pub fn from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_SIZE]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(&bytes)
            .map_err(|error| KeyError::InvalidPublicKey(error.to_string()))?;
        Ok(Self(bytes))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Check `signature` over `message` under this key.
    ///
    /// # Errors
    ///
    /// Returns `signature::Error` if the signature does not verify.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<(), signature::Error> {
        let key = VerifyingKey::from_bytes(&self.0)?;
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify_strict(message, &signature)
    }
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_base58())
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({self})")
    }
}

impl FromStr for Ed25519PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(decode_base58(s).map_err(KeyError::InvalidPublicKey)?)
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature([u8; ED25519_SIGNATURE_SIZE]);

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub const fn from_bytes(bytes: [u8; ED25519_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    pub fn to_bytes(&self) -> [u8; ED25519_SIGNATURE_SIZE] {
        self.0
    }
}

impl fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_base58())
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({self})")
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        decode_base58(&value)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 key held in process memory.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate a key from operating system randomness.
    ///
    /// # Errors
    ///
    /// Returns an error if the RNG fails.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)?;
        Ok(Self::from_seed(&seed))
    }

    /// Rebuild a key from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// The seed, for wrapping. Handle with care.
    pub fn seed(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// The public half of this key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.key.verifying_key().to_bytes())
    }

    /// Sign `message` as-is.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_verifies_its_own_signatures_only() -> TestResult {
        let key = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let signature = key.sign(b"hello world");

        key.public_key().verify(b"hello world", &signature)?;
        assert!(key.public_key().verify(b"hello worle", &signature).is_err());

        let other = Ed25519KeyPair::from_seed(&[10u8; 32]);
        assert!(other.public_key().verify(b"hello world", &signature).is_err());
        Ok(())
    }

    #[test]
    fn it_renders_keys_as_base58() -> TestResult {
        let key = Ed25519KeyPair::from_seed(&[9u8; 32]).public_key();
        let rendered = key.to_string();
        assert!(rendered.len() >= 43 && rendered.len() <= 44);
        assert_eq!(rendered.parse::<Ed25519PublicKey>()?, key);

        let json = serde_json::to_string(&key)?;
        assert_eq!(json, format!("\"{rendered}\""));
        Ok(())
    }

    #[test]
    fn it_rebuilds_the_same_key_from_its_seed() {
        let key = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let rebuilt = Ed25519KeyPair::from_seed(&key.seed());
        assert_eq!(rebuilt.public_key(), key.public_key());
    }

    #[test]
    fn it_keeps_the_seed_out_of_debug_output() {
        let key = Ed25519KeyPair::from_seed(&[0x42; 32]);
        assert!(!format!("{key:?}").contains("66, 66"));
    }
}
