//! The signing network as the protocol sees it.

use crate::{
    DelegationProof, DelegationRequest, GenerateWrappedKeyRequest, ProtocolError, SessionCredential,
    SessionRequest, WrappedKeyRecord, WrappedKeySignRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use warden_common::Keccak256Hash;
use warden_credentials::{Ed25519Signature, PublicKey, RecoverableSignature};

/// A request to sign a digest under a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// Key pair to sign with.
    pub public_key: PublicKey,
    /// Session authorizing the signature.
    pub session: SessionCredential,
    /// The digest to sign. Raw messages are never submitted.
    pub to_sign: Keccak256Hash,
}

/// How the signing network refused or failed a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The network could not be reached.
    #[error("network transport failure: {0}")]
    Transport(String),

    /// The request was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The policy engine refused the session.
    #[error("policy rejected: {reason}")]
    PolicyRejected {
        /// The engine's reason
        reason: String,
    },

    /// The capacity delegation does not cover another session.
    #[error("capacity denied: {reason}")]
    CapacityDenied {
        /// Why capacity was refused
        reason: String,
    },

    /// The network refused to act on an otherwise well-formed request.
    #[error("refused: {0}")]
    Refused(String),
}

impl NetworkError {
    /// Classify a failure on the session issuance path.
    pub fn into_session_error(self) -> ProtocolError {
        match self {
            NetworkError::PolicyRejected { reason } | NetworkError::CapacityDenied { reason } => {
                ProtocolError::AuthorizationDenied { reason }
            }
            other => ProtocolError::SessionIssuance(other.to_string()),
        }
    }

    /// Classify a failure on the signing path.
    pub fn into_signing_error(self) -> ProtocolError {
        ProtocolError::Signing(self.to_string())
    }
}

/// The remote network that holds key shares and runs policies.
///
/// Every check that matters (policy evaluation, capacity accounting,
/// session expiry and scope) happens behind this interface, never in the
/// caller.
#[async_trait]
pub trait SigningNetwork: Send + Sync {
    /// Delegate capacity from a grant to an address.
    async fn create_delegation_proof(
        &self,
        request: DelegationRequest,
    ) -> Result<DelegationProof, NetworkError>;

    /// Run the policy and, if it accepts, issue a session credential.
    async fn issue_session_sigs(
        &self,
        request: SessionRequest,
    ) -> Result<SessionCredential, NetworkError>;

    /// Sign a digest under a session.
    async fn sign(&self, request: SignRequest) -> Result<RecoverableSignature, NetworkError>;

    /// Generate a wrapped key owned by the session's key pair.
    async fn generate_wrapped_key(
        &self,
        request: GenerateWrappedKeyRequest,
    ) -> Result<WrappedKeyRecord, NetworkError>;

    /// Sign a message with a wrapped key the session's key pair owns.
    async fn sign_with_wrapped_key(
        &self,
        request: WrappedKeySignRequest,
    ) -> Result<Ed25519Signature, NetworkError>;
}

#[async_trait]
impl<N> SigningNetwork for Arc<N>
where
    N: SigningNetwork + ?Sized,
{
    async fn create_delegation_proof(
        &self,
        request: DelegationRequest,
    ) -> Result<DelegationProof, NetworkError> {
        (**self).create_delegation_proof(request).await
    }

    async fn issue_session_sigs(
        &self,
        request: SessionRequest,
    ) -> Result<SessionCredential, NetworkError> {
        (**self).issue_session_sigs(request).await
    }

    async fn sign(&self, request: SignRequest) -> Result<RecoverableSignature, NetworkError> {
        (**self).sign(request).await
    }

    async fn generate_wrapped_key(
        &self,
        request: GenerateWrappedKeyRequest,
    ) -> Result<WrappedKeyRecord, NetworkError> {
        (**self).generate_wrapped_key(request).await
    }

    async fn sign_with_wrapped_key(
        &self,
        request: WrappedKeySignRequest,
    ) -> Result<Ed25519Signature, NetworkError> {
        (**self).sign_with_wrapped_key(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_denies_authorization_for_policy_and_capacity_refusals() {
        let denied = NetworkError::PolicyRejected {
            reason: "assertion expired".into(),
        }
        .into_session_error();
        assert!(matches!(
            denied,
            ProtocolError::AuthorizationDenied { ref reason } if reason == "assertion expired"
        ));

        let exhausted = NetworkError::CapacityDenied {
            reason: "capacity exhausted".into(),
        }
        .into_session_error();
        assert!(matches!(
            exhausted,
            ProtocolError::AuthorizationDenied { ref reason } if reason == "capacity exhausted"
        ));
    }

    #[test]
    fn it_treats_transport_failures_as_retryable_issuance_errors() {
        let error = NetworkError::Transport("timed out".into()).into_session_error();
        assert!(matches!(error, ProtocolError::SessionIssuance(_)));
        assert!(error.is_retryable());
    }

    #[test]
    fn it_reports_every_signing_failure_as_a_signing_error() {
        let error = NetworkError::Refused("session expired".into()).into_signing_error();
        assert_eq!(error.to_string(), "signing failed: refused: session expired");
    }
}
