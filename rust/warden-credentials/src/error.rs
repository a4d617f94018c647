//! Error types for key, address and signature operations.

use crate::Address;
use thiserror::Error;
use warden_common::HexError;

/// Errors from constructing keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The bytes are not a valid SEC1-encoded secp256k1 point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The secret scalar is zero, out of range or the wrong length.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Random number generation failed.
    #[error("RNG error: {0}")]
    Rng(getrandom::Error),
}

impl From<getrandom::Error> for KeyError {
    fn from(e: getrandom::Error) -> Self {
        Self::Rng(e)
    }
}

/// Errors that can occur when parsing an [`Address`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressFromStrError {
    /// The string is not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidHex(#[from] HexError),

    /// The string is mixed-case but the casing is not a valid checksum.
    #[error("address checksum mismatch")]
    Checksum,
}

/// Errors from checking a signature against an expected signer.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No public key can be recovered from the signature.
    #[error("signature is not recoverable: {0}")]
    Unrecoverable(signature::Error),

    /// A key was recovered but belongs to someone else.
    #[error("recovered address {recovered} does not match expected {expected}")]
    AddressMismatch {
        /// The address the signature was expected to come from
        expected: Address,
        /// The address actually recovered
        recovered: Address,
    },
}
