use thiserror::Error;
use warden_credentials::{Address, Ed25519PublicKey, VerificationError};
use warden_identity::IdentityError;
use warden_ledger::LedgerError;

/// Everything that can end a protocol run.
///
/// Each call is a single attempt. [`ProtocolError::is_retryable`] says
/// whether trying the same call again can help; for everything else the
/// caller must change something first (re-authenticate, issue a new
/// session, pick another authorization path).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Required settings are missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The identity assertion could not be obtained or decoded.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The policy engine or the capacity check refused the session.
    #[error("authorization denied: {reason}")]
    AuthorizationDenied {
        /// The refusal reason, verbatim
        reason: String,
    },

    /// A ledger read or write failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The session credential could not be obtained.
    #[error("session issuance failed: {0}")]
    SessionIssuance(String),

    /// The network refused to sign.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature did not recover to the key pair's address.
    #[error(
        "signature verification failed: expected {expected}, recovered {}",
        describe_recovered(.recovered)
    )]
    SignatureVerificationFailure {
        /// The key pair's address
        expected: Address,
        /// What the signature recovered to, if anything
        recovered: Option<Address>,
    },

    /// A wrapped-key signature did not verify under its public key.
    #[error("wrapped key signature does not verify under {public_key}")]
    WrappedKeyVerificationFailure {
        /// The wrapped key's public half
        public_key: Ed25519PublicKey,
    },
}

fn describe_recovered(recovered: &Option<Address>) -> String {
    match recovered {
        Some(address) => address.to_string(),
        None => "no key".to_string(),
    }
}

impl ProtocolError {
    /// Whether repeating the failed call unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProtocolError::SessionIssuance(_) => true,
            ProtocolError::Ledger(error) => error.is_transport(),
            _ => false,
        }
    }

    pub(crate) fn verification(expected: Address, error: VerificationError) -> Self {
        match error {
            VerificationError::AddressMismatch { recovered, .. } => {
                ProtocolError::SignatureVerificationFailure {
                    expected,
                    recovered: Some(recovered),
                }
            }
            VerificationError::Unrecoverable(_) => ProtocolError::SignatureVerificationFailure {
                expected,
                recovered: None,
            },
        }
    }
}
