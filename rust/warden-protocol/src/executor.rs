use crate::{Connection, ProtocolError, SessionCredential, SignRequest, SigningNetwork};
use serde::{Deserialize, Serialize};
use tracing::info;
use warden_common::Keccak256Hash;
use warden_credentials::{Address, AddressVerifier, RecoverableSignature};
use warden_ledger::KeyPairRecord;

/// Something to sign: text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text, signed as its bytes.
    Text(String),
    /// Arbitrary bytes.
    Bytes(Vec<u8>),
}

impl Message {
    /// The canonical byte form.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Message::Text(text) => text.as_bytes(),
            Message::Bytes(bytes) => bytes,
        }
    }

    /// The digest that is actually signed.
    pub fn digest(&self) -> Keccak256Hash {
        Keccak256Hash::hash(self.as_bytes())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&[u8]> for Message {
    fn from(bytes: &[u8]) -> Self {
        Message::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Message {
    fn from(bytes: Vec<u8>) -> Self {
        Message::Bytes(bytes)
    }
}

/// A signature over a message digest, checkable without any session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    /// The digest that was signed.
    pub data_signed: Keccak256Hash,
    /// The signature, flattened to `r`, `s` and `recoveryId`.
    #[serde(flatten)]
    pub signature: RecoverableSignature,
}

impl SignatureResult {
    /// Recover the signer and check it is `expected`.
    ///
    /// A mismatch is [`ProtocolError::SignatureVerificationFailure`], always.
    pub fn verify(&self, expected: &Address) -> Result<Address, ProtocolError> {
        AddressVerifier::new(*expected)
            .verify(&self.data_signed, &self.signature)
            .map_err(|error| ProtocolError::verification(*expected, error))
    }

    /// Check the result was produced by `key`.
    pub fn verify_for(&self, key: &KeyPairRecord) -> Result<Address, ProtocolError> {
        self.verify(&key.address)
    }
}

/// Requests signatures under an active session.
pub struct SigningExecutor<N> {
    network: Connection<N>,
}

impl<N> SigningExecutor<N>
where
    N: SigningNetwork + 'static,
{
    /// An executor signing through `network`.
    pub fn new(network: Connection<N>) -> Self {
        Self { network }
    }

    /// Sign `message` with `key` under `session`.
    ///
    /// Only the digest leaves the process. Expiry and scope are the
    /// network's to enforce; a refusal surfaces as
    /// [`ProtocolError::Signing`].
    pub async fn sign(
        &self,
        session: &SessionCredential,
        key: &KeyPairRecord,
        message: impl Into<Message>,
    ) -> Result<SignatureResult, ProtocolError> {
        let data_signed = message.into().digest();

        let network = self.network.get().await?;
        let signature = network
            .sign(SignRequest {
                public_key: key.public_key.clone(),
                session: session.clone(),
                to_sign: data_signed,
            })
            .await
            .map_err(|error| error.into_signing_error())?;

        info!(token = %key.token_id, digest = %data_signed, "Signed digest");
        Ok(SignatureResult {
            data_signed,
            signature,
        })
    }
}
