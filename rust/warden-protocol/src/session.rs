//! Session credentials and the broker that requests them.

use crate::{
    CapacityDelegationGrant, Connection, DelegationProof, Envelope, ProtocolError, SigningNetwork,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use warden_common::{Clock, Duration, Timestamp};
use warden_credentials::PublicKey;
use warden_identity::IdentityAssertion;
use warden_ledger::{KeyPairRecord, TokenId};
use warden_policy::{PolicyDescriptor, PolicyParams};

/// How long a session lasts. Fixed policy, not a caller choice.
pub const SESSION_TTL: Duration = Duration::from_secs(600);

const PKP_SCHEME: &str = "pkp://";
const WILDCARD: &str = "*";

/// What a session lets its holder do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Request signatures from a key pair.
    #[serde(rename = "pkp-signing")]
    PkpSigning,
}

/// The key pairs a resource request covers: `pkp://*` or `pkp://<tokenId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PkpResource(String);

impl PkpResource {
    /// Every key pair.
    pub fn wildcard() -> Self {
        Self(format!("{PKP_SCHEME}{WILDCARD}"))
    }

    /// One key pair.
    pub fn token(token: &TokenId) -> Self {
        Self(format!("{PKP_SCHEME}{token}"))
    }

    /// Whether this resource includes `token`.
    pub fn covers(&self, token: &TokenId) -> bool {
        match self.0.strip_prefix(PKP_SCHEME) {
            Some(WILDCARD) => true,
            Some(id) => id.parse::<TokenId>().is_ok_and(|id| id == *token),
            None => false,
        }
    }
}

impl fmt::Display for PkpResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `(resource, ability)` pair a session asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAbilityRequest {
    /// Which key pairs.
    pub resource: PkpResource,
    /// What may be done with them.
    pub ability: Ability,
}

impl ResourceAbilityRequest {
    /// Signing with the key pairs in `resource`.
    pub fn pkp_signing(resource: PkpResource) -> Self {
        Self {
            resource,
            ability: Ability::PkpSigning,
        }
    }

    /// Whether this request lets its holder sign with `token`.
    pub fn permits_signing(&self, token: &TokenId) -> bool {
        self.ability == Ability::PkpSigning && self.resource.covers(token)
    }
}

/// What the broker sends to obtain a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Key pair the session is for.
    pub pkp_public_key: PublicKey,
    /// Capacity the session draws on.
    pub capability_proofs: Vec<DelegationProof>,
    /// Base64 policy descriptor for the network to run.
    pub policy: String,
    /// Inputs to the policy.
    pub policy_params: PolicyParams,
    /// What the session should allow.
    pub resource_ability_requests: Vec<ResourceAbilityRequest>,
    /// Requested end of the session window.
    pub expires_at: Timestamp,
}

/// What a session credential grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Key pair the session is bound to.
    pub pkp_public_key: PublicKey,
    /// Capacity the session drew on.
    pub capability_proofs: Vec<DelegationProof>,
    /// What the session allows.
    pub resource_ability_requests: Vec<ResourceAbilityRequest>,
    /// The inputs the policy accepted.
    pub policy_params: PolicyParams,
    /// Start of the validity window.
    pub issued_at: Timestamp,
    /// End of the validity window.
    pub expires_at: Timestamp,
}

impl SessionClaims {
    /// Whether the claims allow signing with `token`.
    pub fn permits_signing(&self, token: &TokenId) -> bool {
        self.resource_ability_requests
            .iter()
            .any(|request| request.permits_signing(token))
    }

    /// Whether `now` falls inside the validity window.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.issued_at <= now && now < self.expires_at
    }

    /// Structural checks a credential for `key` must pass before use.
    pub fn validate_for(&self, key: &KeyPairRecord) -> Result<(), String> {
        if self.pkp_public_key != key.public_key {
            return Err("credential is bound to a different key pair".into());
        }
        if !self.permits_signing(&key.token_id) {
            return Err("credential does not grant signing with this key pair".into());
        }
        if self.expires_at <= self.issued_at {
            return Err("credential window is empty".into());
        }
        if self.expires_at > self.issued_at + SESSION_TTL {
            return Err("credential window exceeds the session lifetime".into());
        }
        Ok(())
    }
}

/// Claims sealed by the signing network.
pub type SessionCredential = Envelope<SessionClaims>;

/// Turns an identity assertion and a capacity delegation into a session.
///
/// The broker only transports: the network runs the policy and decides.
pub struct SessionBroker<N> {
    network: Connection<N>,
    policy: PolicyDescriptor,
    clock: Arc<dyn Clock>,
    strict_resource_scope: bool,
}

impl<N> SessionBroker<N>
where
    N: SigningNetwork + 'static,
{
    /// A broker asking `network` to run `policy`.
    pub fn new(network: Connection<N>, policy: PolicyDescriptor, clock: Arc<dyn Clock>) -> Self {
        Self {
            network,
            policy,
            clock,
            strict_resource_scope: false,
        }
    }

    /// Scope sessions to the target key pair instead of every key pair.
    pub fn with_strict_resource_scope(mut self, strict: bool) -> Self {
        self.strict_resource_scope = strict;
        self
    }

    /// Request a session over `key` for the holder of `identity`.
    pub async fn issue_session(
        &self,
        identity: &IdentityAssertion,
        key: &KeyPairRecord,
        capacity: &CapacityDelegationGrant,
    ) -> Result<SessionCredential, ProtocolError> {
        let resource = if self.strict_resource_scope {
            PkpResource::token(&key.token_id)
        } else {
            PkpResource::wildcard()
        };
        let policy = self
            .policy
            .to_base64()
            .map_err(|error| ProtocolError::Configuration(error.to_string()))?;
        let issued_at = self.clock.now();

        let request = SessionRequest {
            pkp_public_key: key.public_key.clone(),
            capability_proofs: vec![capacity.proof.clone()],
            policy,
            policy_params: PolicyParams::new(identity, key.token_id)?,
            resource_ability_requests: vec![ResourceAbilityRequest::pkp_signing(resource)],
            expires_at: issued_at + SESSION_TTL,
        };

        let network = self.network.get().await?;
        let credential = network
            .issue_session_sigs(request)
            .await
            .map_err(|error| error.into_session_error())?;

        credential
            .validate_for(key)
            .map_err(ProtocolError::SessionIssuance)?;

        info!(
            token = %key.token_id,
            expires_at = %credential.expires_at,
            "Issued session"
        );
        Ok(credential)
    }
}
