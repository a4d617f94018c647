//! Offline signature verification against a published address.

use crate::{Address, RecoverableSignature, VerificationError};
use warden_common::Keccak256Hash;

/// Verifies that signatures were produced by the key behind a known address.
///
/// Verification is purely local: the signer's key is recovered from the
/// digest and signature, its address derived, and the result compared to
/// the expected address. No session or network access is involved.
///
/// # Example
///
/// ```rust
/// use warden_common::Keccak256Hash;
/// use warden_credentials::{AddressVerifier, Secp256k1Signer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let signer = Secp256k1Signer::generate()?;
/// let digest = Keccak256Hash::hash(b"hello world");
/// let signature = signer.sign_prehash(&digest)?;
///
/// let verifier = AddressVerifier::new(signer.address());
/// assert_eq!(verifier.verify(&digest, &signature)?, signer.address());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressVerifier {
    expected: Address,
}

impl AddressVerifier {
    /// Create a verifier expecting signatures from `expected`.
    pub fn new(expected: Address) -> Self {
        Self { expected }
    }

    /// The address signatures must recover to.
    pub fn expected(&self) -> &Address {
        &self.expected
    }

    /// Recover the signer of `digest` and check it is the expected address.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::Unrecoverable`] if no key can be
    /// recovered, or [`VerificationError::AddressMismatch`] if a different
    /// key signed.
    pub fn verify(
        &self,
        digest: &Keccak256Hash,
        signature: &RecoverableSignature,
    ) -> Result<Address, VerificationError> {
        let recovered = signature
            .recover_address(digest)
            .map_err(VerificationError::Unrecoverable)?;

        if recovered != self.expected {
            return Err(VerificationError::AddressMismatch {
                expected: self.expected,
                recovered,
            });
        }

        Ok(recovered)
    }
}
