//! Capacity grants and their delegation to key pairs.

use crate::{CapacityConfig, Connection, Envelope, ProtocolError, SigningNetwork};
use serde::{Deserialize, Serialize};
use tracing::info;
use warden_common::Timestamp;
use warden_credentials::Address;
use warden_ledger::{GrantId, Ledger};

/// Parameters for delegating capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRequest {
    /// Grant to draw on.
    pub grant_id: GrantId,
    /// Owner of the grant.
    pub delegator: Address,
    /// Address allowed to spend the delegated uses.
    pub delegatee: Address,
    /// Number of sessions the delegation covers.
    pub uses: u32,
}

/// What a delegation proof attests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityDelegation {
    /// Grant drawn on.
    pub grant_id: GrantId,
    /// Owner of the grant.
    pub delegator: Address,
    /// Address allowed to spend the uses.
    pub delegatee: Address,
    /// Number of sessions covered.
    pub uses: u32,
    /// When the underlying grant expires.
    pub expires_at: Timestamp,
    /// Distinguishes otherwise identical delegations.
    pub nonce: u64,
}

/// A capacity delegation sealed by the signing network.
pub type DelegationProof = Envelope<CapacityDelegation>;

/// A capacity grant delegated to one key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityDelegationGrant {
    /// The underlying ledger grant.
    pub grant_id: GrantId,
    /// The key pair address the uses are delegated to.
    pub delegatee: Address,
    /// Sessions the delegation still covers at issuance.
    pub uses_remaining: u32,
    /// When the grant stops being honoured.
    pub expires_at: Timestamp,
    /// What the session broker presents to the network.
    pub proof: DelegationProof,
}

/// Obtains a capacity grant and delegates part of it to a key pair.
pub struct CapacityIssuer<L, N> {
    ledger: Connection<L>,
    network: Connection<N>,
    config: CapacityConfig,
    owner: Address,
}

impl<L, N> CapacityIssuer<L, N>
where
    L: Ledger + 'static,
    N: SigningNetwork + 'static,
{
    /// An issuer spending grants owned by `owner`.
    pub fn new(
        ledger: Connection<L>,
        network: Connection<N>,
        config: CapacityConfig,
        owner: Address,
    ) -> Self {
        Self {
            ledger,
            network,
            config,
            owner,
        }
    }

    /// Resolve a grant and delegate `uses_per_session` of it to `delegatee`.
    ///
    /// A configured grant id is trusted as-is; otherwise a fresh grant is
    /// minted. Nothing is cached between calls.
    pub async fn obtain_grant(
        &self,
        delegatee: &Address,
    ) -> Result<CapacityDelegationGrant, ProtocolError> {
        let grant_id = match self.config.grant_id {
            Some(grant_id) => {
                info!(%grant_id, "Using provided capacity grant");
                grant_id
            }
            None => {
                let ledger = self.ledger.get().await?;
                let grant_id = ledger.mint_capacity_grant(self.config.params()).await?;
                info!(%grant_id, "Minted capacity grant");
                grant_id
            }
        };

        let network = self.network.get().await?;
        let proof = network
            .create_delegation_proof(DelegationRequest {
                grant_id,
                delegator: self.owner,
                delegatee: *delegatee,
                uses: self.config.uses_per_session,
            })
            .await
            .map_err(|error| error.into_session_error())?;

        info!(%grant_id, %delegatee, uses = proof.uses, "Delegated capacity");

        Ok(CapacityDelegationGrant {
            grant_id,
            delegatee: *delegatee,
            uses_remaining: proof.uses,
            expires_at: proof.expires_at,
            proof,
        })
    }
}
