//! Wrapped keys: keys generated inside the signing network, stored only in
//! encrypted form, and usable only under a session for the key pair that
//! owns them.

use crate::{Connection, Message, ProtocolError, SessionCredential, SigningNetwork};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use warden_common::Timestamp;
use warden_credentials::{Address, Ed25519PublicKey, Ed25519Signature};

/// Chains a wrapped key can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrappedKeyNetwork {
    /// Ed25519 keys with base58 addresses.
    #[serde(rename = "solana")]
    Solana,
}

impl fmt::Display for WrappedKeyNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrappedKeyNetwork::Solana => f.write_str("solana"),
        }
    }
}

/// What the owner learns about a freshly generated wrapped key.
///
/// The private half never appears here; the network keeps it encrypted and
/// bound to `pkp_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedKeyRecord {
    /// Network-assigned identifier.
    pub id: String,
    /// Address of the key pair whose sessions may use the key.
    pub pkp_address: Address,
    /// Chain the key is for.
    pub network: WrappedKeyNetwork,
    /// The wrapped key's public half.
    pub generated_public_key: Ed25519PublicKey,
    /// Free-form label supplied at generation.
    pub memo: String,
    /// When the key was generated.
    pub created_at: Timestamp,
}

/// Ask the network to generate a wrapped key for the session's key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWrappedKeyRequest {
    /// Session over the owning key pair.
    pub session: SessionCredential,
    /// Chain to generate for.
    pub network: WrappedKeyNetwork,
    /// Free-form label.
    pub memo: String,
}

/// Ask the network to sign with a wrapped key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedKeySignRequest {
    /// Session over the owning key pair.
    pub session: SessionCredential,
    /// Which wrapped key.
    pub id: String,
    /// The message, signed as-is.
    pub message: Vec<u8>,
}

/// A wrapped-key signature, checkable offline against the public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedKeySignature {
    /// The wrapped key that signed.
    pub id: String,
    /// Its public half.
    pub public_key: Ed25519PublicKey,
    /// The signature.
    pub signature: Ed25519Signature,
}

impl WrappedKeySignature {
    /// Check the signature covers `message`.
    pub fn verify(&self, message: impl Into<Message>) -> Result<(), ProtocolError> {
        self.public_key
            .verify(message.into().as_bytes(), &self.signature)
            .map_err(|_| ProtocolError::WrappedKeyVerificationFailure {
                public_key: self.public_key,
            })
    }
}

/// Generates and uses wrapped keys under a session.
pub struct WrappedKeyManager<N> {
    network: Connection<N>,
}

impl<N> WrappedKeyManager<N>
where
    N: SigningNetwork + 'static,
{
    /// A manager talking to `network`.
    pub fn new(network: Connection<N>) -> Self {
        Self { network }
    }

    /// Generate a wrapped key owned by the session's key pair.
    pub async fn generate(
        &self,
        session: &SessionCredential,
        network: WrappedKeyNetwork,
        memo: impl Into<String>,
    ) -> Result<WrappedKeyRecord, ProtocolError> {
        let client = self.network.get().await?;
        let record = client
            .generate_wrapped_key(GenerateWrappedKeyRequest {
                session: session.clone(),
                network,
                memo: memo.into(),
            })
            .await
            .map_err(|error| error.into_signing_error())?;

        info!(
            id = %record.id,
            pkp_address = %record.pkp_address,
            public_key = %record.generated_public_key,
            "Generated wrapped key"
        );
        Ok(record)
    }

    /// Sign `message` with the wrapped key `record`.
    ///
    /// The network refuses unless `session` is live and belongs to the key
    /// pair that owns the wrapped key.
    pub async fn sign(
        &self,
        session: &SessionCredential,
        record: &WrappedKeyRecord,
        message: impl Into<Message>,
    ) -> Result<WrappedKeySignature, ProtocolError> {
        let client = self.network.get().await?;
        let signature = client
            .sign_with_wrapped_key(WrappedKeySignRequest {
                session: session.clone(),
                id: record.id.clone(),
                message: message.into().as_bytes().to_vec(),
            })
            .await
            .map_err(|error| error.into_signing_error())?;

        info!(id = %record.id, "Signed with wrapped key");
        Ok(WrappedKeySignature {
            id: record.id.clone(),
            public_key: record.generated_public_key,
            signature,
        })
    }
}
