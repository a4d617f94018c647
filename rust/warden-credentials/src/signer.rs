//! Local secp256k1 signer.

use crate::{Address, KeyError, PublicKey, RecoverableSignature};
use k256::ecdsa::SigningKey;
use warden_common::Keccak256Hash;

/// A secp256k1 signing key held in process memory.
///
/// Programmable key pairs never exist in this form outside the signing
/// network; this type backs the in-process network stand-in and the
/// network's own attestation key.
#[derive(Clone)]
pub struct Secp256k1Signer {
    key: SigningKey,
    public_key: PublicKey,
}

impl Secp256k1Signer {
    /// Generate a new key from operating system randomness.
    ///
    /// # Errors
    ///
    /// Returns an error if the RNG fails or (with negligible probability)
    /// yields a seed outside the scalar field.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)?;
        Self::import(&seed)
    }

    /// Import a 32-byte big-endian secret scalar.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidSecretKey`] if the bytes are the wrong
    /// length, zero, or not below the curve order.
    pub fn import(secret: &[u8]) -> Result<Self, KeyError> {
        let key = SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        let public_key = PublicKey::from(key.verifying_key());
        Ok(Self { key, public_key })
    }

    /// The public half of this key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        self.public_key.address()
    }

    /// Sign a 32-byte digest, producing a low-`s` recoverable signature.
    ///
    /// # Errors
    ///
    /// Returns `signature::Error` if the signing primitive fails.
    pub fn sign_prehash(
        &self,
        prehash: &Keccak256Hash,
    ) -> Result<RecoverableSignature, signature::Error> {
        let (signature, recovery_id) = self.key.sign_prehash_recoverable(prehash.as_slice())?;
        let bytes = signature.to_bytes();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

impl std::fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
