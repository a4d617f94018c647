use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use warden_common::{HexError, Keccak256Hash};
use warden_credentials::{Address, PublicKey};

/// Ledger identifier of a key pair: `keccak256` of its uncompressed public
/// key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(Keccak256Hash);

impl TokenId {
    /// Derive the token id of `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(public_key.keccak256())
    }

    /// The underlying digest.
    pub fn hash(&self) -> &Keccak256Hash {
        &self.0
    }
}

impl From<Keccak256Hash> for TokenId {
    fn from(hash: Keccak256Hash) -> Self {
        Self(hash)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

impl FromStr for TokenId {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keccak256Hash::from_str(s).map(Self)
    }
}

/// A minted programmable key pair. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairRecord {
    /// Ledger id, derived from `public_key`.
    pub token_id: TokenId,
    /// The distributed key's public half.
    pub public_key: PublicKey,
    /// The address signatures recover to.
    pub address: Address,
}

impl KeyPairRecord {
    /// Derive the whole record from a public key.
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self {
            token_id: TokenId::from_public_key(&public_key),
            address: public_key.address(),
            public_key,
        }
    }
}
