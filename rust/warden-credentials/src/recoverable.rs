//! Recoverable ECDSA signatures.

use crate::{Address, PublicKey};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use warden_common::Keccak256Hash;

/// An ECDSA signature over secp256k1 with the recovery id needed to
/// reconstruct the signer's public key from the signed digest alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverableSignature {
    /// The `r` scalar, big-endian.
    #[serde(with = "warden_common::hex_array")]
    pub r: [u8; 32],

    /// The `s` scalar, big-endian.
    #[serde(with = "warden_common::hex_array")]
    pub s: [u8; 32],

    /// Which of the candidate points is the signer's key (0 or 1 for
    /// signatures produced by this crate).
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// Recover the public key that produced this signature over `prehash`.
    ///
    /// # Errors
    ///
    /// Returns `signature::Error` if `r`/`s` are not valid scalars, the
    /// recovery id is out of range, or no key verifies the signature.
    pub fn recover(&self, prehash: &Keccak256Hash) -> Result<PublicKey, signature::Error> {
        let signature = Signature::from_scalars(self.r, self.s)?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id).ok_or_else(signature::Error::new)?;
        let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id)?;
        Ok(PublicKey::from(&key))
    }

    /// Recover the address of the key that produced this signature.
    ///
    /// # Errors
    ///
    /// See [`RecoverableSignature::recover`].
    pub fn recover_address(&self, prehash: &Keccak256Hash) -> Result<Address, signature::Error> {
        self.recover(prehash).map(|key| key.address())
    }

    /// The 65-byte `r ‖ s ‖ v` encoding.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.recovery_id;
        bytes
    }
}
