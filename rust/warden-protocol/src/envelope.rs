//! Payloads sealed with a recoverable signature.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use thiserror::Error;
use warden_common::Keccak256Hash;
use warden_credentials::{Address, RecoverableSignature, Secp256k1Signer};

/// Failures sealing or opening an [`Envelope`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload could not be encoded for signing.
    #[error("cannot encode payload: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Signing or recovery failed.
    #[error("signature error: {0}")]
    Signature(String),
}

/// A payload and a signature over the Keccak-256 digest of its JSON
/// encoding.
///
/// The issuer is whoever the signature recovers to, so altering any field of
/// the payload changes who appears to have issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The signed content.
    pub payload: T,
    /// Signature over [`Envelope::digest`].
    pub signature: RecoverableSignature,
}

impl<T> Envelope<T>
where
    T: Serialize,
{
    /// Digest a payload is signed under.
    pub fn digest_of(payload: &T) -> Result<Keccak256Hash, EnvelopeError> {
        Ok(Keccak256Hash::hash(&serde_json::to_vec(payload)?))
    }

    /// Sign `payload` with `signer`.
    pub fn seal(payload: T, signer: &Secp256k1Signer) -> Result<Self, EnvelopeError> {
        let digest = Self::digest_of(&payload)?;
        let signature = signer
            .sign_prehash(&digest)
            .map_err(|error| EnvelopeError::Signature(error.to_string()))?;
        Ok(Self { payload, signature })
    }

    /// Digest of this envelope's payload.
    pub fn digest(&self) -> Result<Keccak256Hash, EnvelopeError> {
        Self::digest_of(&self.payload)
    }

    /// The address that sealed the current payload.
    pub fn issuer(&self) -> Result<Address, EnvelopeError> {
        self.signature
            .recover_address(&self.digest()?)
            .map_err(|error| EnvelopeError::Signature(error.to_string()))
    }

    /// Whether `address` sealed the current payload.
    pub fn is_issued_by(&self, address: &Address) -> bool {
        self.issuer().is_ok_and(|issuer| issuer == *address)
    }
}

impl<T> Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.payload
    }
}
