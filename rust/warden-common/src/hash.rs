use std::{array::TryFromSliceError, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::{HexError, decode_hex_array, encode_hex};

/// The size of a Keccak-256 hash in bytes.
pub const KECCAK256_HASH_SIZE: usize = 32;

/// A Keccak-256 cryptographic hash.
///
/// This is a wrapper around a 32-byte array that represents a Keccak-256
/// digest (the pre-standard SHA-3 variant used by the ledger). Token ids,
/// auth method ids, ledger addresses and the payload handed to the signing
/// network are all derived with it.
///
/// # Examples
///
/// ```rust
/// use warden_common::Keccak256Hash;
///
/// let hash = Keccak256Hash::hash(b"hello world");
/// assert_eq!(
///     hash.to_string(),
///     "0x47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad"
/// );
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Keccak256Hash([u8; KECCAK256_HASH_SIZE]);

impl Keccak256Hash {
    /// Computes the Keccak-256 hash of the given bytes.
    pub fn hash(bytes: &[u8]) -> Self {
        Self::from_digest(Keccak256::digest(bytes).as_slice())
    }

    /// Computes the Keccak-256 hash over a sequence of chunks, as if they
    /// were concatenated.
    pub fn hash_iter<'a, I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Keccak256::new();
        for chunk in chunks {
            hasher.update(chunk);
        }
        Self::from_digest(hasher.finalize().as_slice())
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; KECCAK256_HASH_SIZE];
        bytes.copy_from_slice(digest);
        Self(bytes)
    }

    /// The raw digest.
    pub fn bytes(&self) -> &[u8; KECCAK256_HASH_SIZE] {
        &self.0
    }

    /// The raw digest as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; KECCAK256_HASH_SIZE]> for Keccak256Hash {
    fn from(value: [u8; KECCAK256_HASH_SIZE]) -> Self {
        Keccak256Hash(value)
    }
}

impl From<Keccak256Hash> for [u8; KECCAK256_HASH_SIZE] {
    fn from(value: Keccak256Hash) -> Self {
        value.0
    }
}

impl TryFrom<&[u8]> for Keccak256Hash {
    type Error = TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Keccak256Hash(value.try_into()?))
    }
}

impl AsRef<[u8]> for Keccak256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(self.0))
    }
}

impl fmt::Debug for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak256Hash({self})")
    }
}

impl FromStr for Keccak256Hash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex_array(s).map(Self)
    }
}

impl Serialize for Keccak256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Keccak256Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
