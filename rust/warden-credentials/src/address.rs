//! Ledger addresses derived from public keys.

use crate::{AddressFromStrError, PublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use warden_common::{Keccak256Hash, decode_hex_array};

/// A 20-byte ledger address: the last 20 bytes of the Keccak-256 digest of
/// the uncompressed public key (without its `0x04` tag).
///
/// Displays with the mixed-case checksum from EIP-55. Parsing accepts
/// all-lowercase and all-uppercase input unconditionally and validates the
/// checksum of mixed-case input.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address controlled by `key`.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Keccak256Hash::hash(&key.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_slice()[12..]);
        Self(bytes)
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    fn checksummed(&self) -> String {
        let lower: String = self.0.iter().map(|byte| format!("{byte:02x}")).collect();
        let digest = Keccak256Hash::hash(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (index, character) in lower.chars().enumerate() {
            let byte = digest.as_slice()[index / 2];
            let nibble = if index % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                out.push(character.to_ascii_uppercase());
            } else {
                out.push(character);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksummed())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address(decode_hex_array(s)?);

        let digits = s.strip_prefix("0x").unwrap_or(s);
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.checksummed()[2..] != *digits {
            return Err(AddressFromStrError::Checksum);
        }

        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.checksummed())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secp256k1Signer;
    use testresult::TestResult;

    #[test]
    fn it_renders_the_eip55_checksum() -> TestResult {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse()?;
        assert_eq!(
            address.to_string(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        Ok(())
    }

    #[test]
    fn it_rejects_a_bad_checksum() {
        let result: Result<Address, _> = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD".parse();
        assert_eq!(result, Err(AddressFromStrError::Checksum));
    }

    #[test]
    fn it_derives_the_address_of_secret_one() -> TestResult {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signer = Secp256k1Signer::import(&secret)?;
        assert_eq!(
            signer.address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
        Ok(())
    }
}
