//! Concrete key and signature types for programmable key pairs.
//!
//! A programmable key pair is a secp256k1 key whose private half lives in
//! the signing network. Locally we only ever hold:
//!
//! - the [`PublicKey`] published at mint time,
//! - the [`Address`] derived from it,
//! - [`RecoverableSignature`]s returned by the network.
//!
//! [`AddressVerifier`] closes the loop offline: it recovers the signer from a
//! signature and compares it to the address the ledger published.
//! [`Secp256k1Signer`] is a local key used by in-process stand-ins for the
//! network and by tests.
//!
//! Wrapped keys are Ed25519: [`Ed25519KeyPair`] is generated inside the
//! network and only ever leaves it encrypted, while [`Ed25519PublicKey`]
//! and [`Ed25519Signature`] are what callers see.

mod address;
mod ed25519;
mod error;
mod public_key;
mod recoverable;
mod signer;
mod verifier;

pub use address::Address;
pub use ed25519::{
    ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE, Ed25519KeyPair, Ed25519PublicKey,
    Ed25519Signature,
};
pub use error::{AddressFromStrError, KeyError, VerificationError};
pub use public_key::{PUBLIC_KEY_SIZE, PublicKey};
pub use recoverable::RecoverableSignature;
pub use signer::Secp256k1Signer;
pub use verifier::AddressVerifier;
