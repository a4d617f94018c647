//! A signing network that runs in-process.

use crate::vault::WrappedKeyVault;
use crate::{
    CapacityDelegation, DelegationProof, DelegationRequest, Envelope, GenerateWrappedKeyRequest,
    NetworkError, SESSION_TTL, SessionClaims, SessionCredential, SessionRequest, SignRequest,
    SigningNetwork, WrappedKeyRecord, WrappedKeySignRequest,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use warden_common::{Clock, Keccak256Hash, Timestamp};
use warden_credentials::{
    Address, Ed25519KeyPair, Ed25519Signature, RecoverableSignature, Secp256k1Signer,
};
use warden_identity::IdentityProvider;
use warden_ledger::{AuthMethodType, GrantId, Ledger, MemoryLedger, TokenId};
use warden_policy::{PolicyDecision, PolicyDescriptor, PolicyEngine};

#[derive(Debug, Default)]
struct DelegationBook {
    remaining: HashMap<Keccak256Hash, u32>,
    next_nonce: u64,
}

/// Length of a rate-limit window, in seconds.
const RATE_WINDOW_SECS: u64 = 1000;

/// Signing requests counted against each grant in its current window.
#[derive(Debug, Default)]
struct RateBook {
    windows: HashMap<GrantId, (u64, u32)>,
}

/// A [`SigningNetwork`] played by a single in-process node.
///
/// It enforces everything a real network does: the policy bound on the
/// ledger is run before any session is issued, capacity uses are counted
/// down atomically, and signatures are only produced under an unexpired
/// session the node itself sealed, for a key the session covers. Keys come
/// from the [`MemoryLedger`]'s custody, so only key pairs minted through
/// that ledger can sign.
///
/// Each signing request also counts against the capacity grant behind the
/// session: a grant allows `requests_per_kilosecond` signatures per
/// 1000-second window, across every key pair it was delegated to.
pub struct MemoryNetwork<P> {
    ledger: MemoryLedger,
    provider: P,
    clock: Arc<dyn Clock>,
    node: Secp256k1Signer,
    delegations: Arc<Mutex<DelegationBook>>,
    rates: Arc<Mutex<RateBook>>,
    vault: Arc<Mutex<WrappedKeyVault>>,
}

impl<P> Clone for MemoryNetwork<P>
where
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            provider: self.provider.clone(),
            clock: self.clock.clone(),
            node: self.node.clone(),
            delegations: self.delegations.clone(),
            rates: self.rates.clone(),
            vault: self.vault.clone(),
        }
    }
}

impl<P> MemoryNetwork<P>
where
    P: IdentityProvider + Clone + 'static,
{
    /// A network over `ledger` that verifies identities with `provider` and
    /// seals credentials as `node`.
    pub fn new(ledger: MemoryLedger, provider: P, node: Secp256k1Signer) -> Self {
        Self {
            clock: ledger.clock(),
            ledger,
            provider,
            node,
            delegations: Arc::new(Mutex::new(DelegationBook::default())),
            rates: Arc::new(Mutex::new(RateBook::default())),
            vault: Arc::new(Mutex::new(WrappedKeyVault::default())),
        }
    }

    /// The address credentials issued by this network recover to.
    pub fn node_address(&self) -> Address {
        self.node.address()
    }

    /// Sessions `proof` still covers, if this network issued it.
    pub async fn remaining_uses(&self, proof: &DelegationProof) -> Option<u32> {
        let digest = proof.digest().ok()?;
        self.delegations.lock().await.remaining.get(&digest).copied()
    }

    fn seal<T: serde::Serialize>(&self, payload: T) -> Result<Envelope<T>, NetworkError> {
        Envelope::seal(payload, &self.node).map_err(|error| NetworkError::Refused(error.to_string()))
    }

    /// Find a delegation in `proofs` that lets `delegatee` open a session.
    ///
    /// Every proof this node issued to `delegatee` is considered, so a
    /// spent or expired delegation does not hide a usable one behind it.
    /// When none is usable the last refusal is reported.
    async fn capacity_for(
        &self,
        proofs: &[DelegationProof],
        delegatee: &Address,
        now: Timestamp,
    ) -> Result<Keccak256Hash, NetworkError> {
        let denied = |reason: &str| NetworkError::CapacityDenied {
            reason: reason.to_string(),
        };

        let book = self.delegations.lock().await;
        let mut refusal = denied("no capacity delegation for this key pair");
        for proof in proofs
            .iter()
            .filter(|proof| proof.is_issued_by(&self.node.address()) && proof.delegatee == *delegatee)
        {
            if now >= proof.expires_at {
                refusal = denied("capacity delegation expired");
                continue;
            }

            let digest = proof
                .digest()
                .map_err(|error| NetworkError::InvalidRequest(error.to_string()))?;
            match book.remaining.get(&digest) {
                None => refusal = denied("unknown capacity delegation"),
                Some(0) => refusal = denied("capacity exhausted"),
                Some(_) => return Ok(digest),
            }
        }

        Err(refusal)
    }

    /// Spend one use of the delegation behind `digest`.
    async fn consume(&self, digest: &Keccak256Hash) -> Result<u32, NetworkError> {
        let mut book = self.delegations.lock().await;
        match book.remaining.get_mut(digest) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(*remaining)
            }
            _ => Err(NetworkError::CapacityDenied {
                reason: "capacity exhausted".into(),
            }),
        }
    }

    /// Check `session` was sealed by this node and is live at `now`.
    fn authorize(&self, session: &SessionCredential, now: Timestamp) -> Result<(), NetworkError> {
        if !session.is_issued_by(&self.node.address()) {
            return Err(NetworkError::Refused(
                "session credential was not issued by this network".into(),
            ));
        }
        if now >= session.expires_at {
            return Err(NetworkError::Refused("session expired".into()));
        }
        if now < session.issued_at {
            return Err(NetworkError::Refused("session is not yet valid".into()));
        }
        Ok(())
    }

    /// Check `session` covers signing with its own key pair, returning the
    /// key pair's address.
    fn session_owner(&self, session: &SessionCredential) -> Result<Address, NetworkError> {
        let token = TokenId::from_public_key(&session.pkp_public_key);
        if !session.permits_signing(&token) {
            return Err(NetworkError::Refused(
                "session does not cover this key pair".into(),
            ));
        }
        Ok(session.pkp_public_key.address())
    }

    /// Count one signing request against the grant behind `session`.
    async fn charge(&self, session: &SessionCredential, now: Timestamp) -> Result<(), NetworkError> {
        let address = session.pkp_public_key.address();
        let grant_id = session
            .capability_proofs
            .iter()
            .find(|proof| proof.is_issued_by(&self.node.address()) && proof.delegatee == address)
            .map(|proof| proof.grant_id)
            .ok_or_else(|| NetworkError::CapacityDenied {
                reason: "session carries no capacity".into(),
            })?;
        let grant = self
            .ledger
            .read_capacity_grant(grant_id)
            .await
            .map_err(transport)?
            .ok_or_else(|| NetworkError::CapacityDenied {
                reason: "unknown capacity grant".into(),
            })?;

        let window = now.to_unix() / RATE_WINDOW_SECS;
        let mut rates = self.rates.lock().await;
        let entry = rates.windows.entry(grant_id).or_insert((window, 0));
        if entry.0 != window {
            *entry = (window, 0);
        }
        if entry.1 >= grant.requests_per_kilosecond {
            return Err(NetworkError::CapacityDenied {
                reason: "capacity rate limit exceeded".into(),
            });
        }
        entry.1 += 1;
        Ok(())
    }
}

fn transport(error: impl std::fmt::Display) -> NetworkError {
    NetworkError::Transport(error.to_string())
}

#[async_trait]
impl<P> SigningNetwork for MemoryNetwork<P>
where
    P: IdentityProvider + Clone + 'static,
{
    async fn create_delegation_proof(
        &self,
        request: DelegationRequest,
    ) -> Result<DelegationProof, NetworkError> {
        if request.uses == 0 {
            return Err(NetworkError::InvalidRequest(
                "a delegation must cover at least one use".into(),
            ));
        }

        let grant = self
            .ledger
            .read_capacity_grant(request.grant_id)
            .await
            .map_err(transport)?
            .ok_or_else(|| {
                NetworkError::InvalidRequest(format!("unknown capacity grant {}", request.grant_id))
            })?;

        if grant.owner != request.delegator {
            return Err(NetworkError::Refused(
                "delegator does not own the capacity grant".into(),
            ));
        }
        if !grant.is_live_at(self.clock.now()) {
            return Err(NetworkError::CapacityDenied {
                reason: "capacity delegation expired".into(),
            });
        }

        let mut book = self.delegations.lock().await;
        let nonce = book.next_nonce;
        book.next_nonce += 1;

        let proof = self.seal(CapacityDelegation {
            grant_id: grant.grant_id,
            delegator: request.delegator,
            delegatee: request.delegatee,
            uses: request.uses,
            expires_at: grant.expires_at,
            nonce,
        })?;
        let digest = proof
            .digest()
            .map_err(|error| NetworkError::InvalidRequest(error.to_string()))?;
        book.remaining.insert(digest, request.uses);

        debug!(grant_id = %grant.grant_id, delegatee = %request.delegatee, "Delegated capacity");
        Ok(proof)
    }

    async fn issue_session_sigs(
        &self,
        request: SessionRequest,
    ) -> Result<SessionCredential, NetworkError> {
        let now = self.clock.now();
        let token = TokenId::from_public_key(&request.pkp_public_key);
        let address = request.pkp_public_key.address();

        if request.policy_params.pkp_token_id != token {
            return Err(NetworkError::InvalidRequest(
                "policy parameters name a different key pair".into(),
            ));
        }
        if !request
            .resource_ability_requests
            .iter()
            .any(|ability| ability.permits_signing(&token))
        {
            return Err(NetworkError::InvalidRequest(
                "no signing ability requested for this key pair".into(),
            ));
        }
        if request.expires_at <= now || request.expires_at > now + SESSION_TTL {
            return Err(NetworkError::InvalidRequest(
                "session window must end within the session lifetime".into(),
            ));
        }

        let descriptor = PolicyDescriptor::from_base64(&request.policy)
            .map_err(|error| NetworkError::InvalidRequest(error.to_string()))?;
        let policy_id = descriptor
            .id()
            .map_err(|error| NetworkError::InvalidRequest(error.to_string()))?;
        let bound = self
            .ledger
            .is_permitted_auth_method(
                &token,
                &AuthMethodType::PolicyScript,
                policy_id.as_bytes(),
            )
            .await
            .map_err(transport)?;
        if !bound {
            return Err(NetworkError::PolicyRejected {
                reason: "policy is not bound to this key pair".into(),
            });
        }

        let delegation = self
            .capacity_for(&request.capability_proofs, &address, now)
            .await?;

        let engine = PolicyEngine::new(
            descriptor,
            self.provider.clone(),
            self.ledger.clone(),
            self.clock.clone(),
        );
        if let PolicyDecision::Reject(reason) = engine.evaluate(&request.policy_params).await {
            return Err(NetworkError::PolicyRejected {
                reason: reason.to_string(),
            });
        }

        let remaining = self.consume(&delegation).await?;
        debug!(%token, remaining, "Consumed capacity");

        self.seal(SessionClaims {
            pkp_public_key: request.pkp_public_key,
            capability_proofs: request.capability_proofs,
            resource_ability_requests: request.resource_ability_requests,
            policy_params: request.policy_params,
            issued_at: now,
            expires_at: request.expires_at,
        })
    }

    async fn sign(&self, request: SignRequest) -> Result<RecoverableSignature, NetworkError> {
        let session = &request.session;
        let now = self.clock.now();
        self.authorize(session, now)?;

        if session.pkp_public_key != request.public_key {
            return Err(NetworkError::Refused(
                "session is bound to a different key pair".into(),
            ));
        }
        let token = TokenId::from_public_key(&request.public_key);
        if !session.permits_signing(&token) {
            return Err(NetworkError::Refused(
                "session does not cover this key pair".into(),
            ));
        }

        let signer = self
            .ledger
            .custody()
            .signer(&token)
            .await
            .ok_or_else(|| NetworkError::Refused("unknown key pair".into()))?;

        self.charge(session, now).await?;
        signer
            .sign_prehash(&request.to_sign)
            .map_err(|error| NetworkError::Refused(error.to_string()))
    }

    async fn generate_wrapped_key(
        &self,
        request: GenerateWrappedKeyRequest,
    ) -> Result<WrappedKeyRecord, NetworkError> {
        let now = self.clock.now();
        self.authorize(&request.session, now)?;
        let owner = self.session_owner(&request.session)?;

        let key = Ed25519KeyPair::generate()
            .map_err(|error| NetworkError::Refused(error.to_string()))?;
        let id = ulid::Ulid::new().to_string();
        self.vault.lock().await.seal(&id, owner, &key)?;

        debug!(%id, %owner, network = %request.network, "Generated wrapped key");
        Ok(WrappedKeyRecord {
            id,
            pkp_address: owner,
            network: request.network,
            generated_public_key: key.public_key(),
            memo: request.memo,
            created_at: now,
        })
    }

    async fn sign_with_wrapped_key(
        &self,
        request: WrappedKeySignRequest,
    ) -> Result<Ed25519Signature, NetworkError> {
        let now = self.clock.now();
        self.authorize(&request.session, now)?;
        let owner = self.session_owner(&request.session)?;

        let key = self.vault.lock().await.open(&request.id, &owner)?;
        self.charge(&request.session, now).await?;
        Ok(key.sign(&request.message))
    }
}
