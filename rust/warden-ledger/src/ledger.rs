use crate::{
    AuthMethodType, BindingSet, CapacityParams, GrantId, GrantRecord, LedgerError,
    PermittedAuthMethod, TokenId, TransactionReceipt,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use warden_credentials::Address;

/// An amount of the ledger's native currency, in its smallest unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    /// Wrap a raw amount.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// The raw amount.
    pub const fn get(self) -> u128 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key algorithms the key registry can mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyType {
    /// secp256k1 ECDSA, the only type in use.
    EcdsaSecp256k1 = 2,
}

/// A single atomic "mint a key pair and bind its auth methods" transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// Algorithm of the key to mint.
    pub key_type: KeyType,
    /// Auth methods to bind.
    pub bindings: BindingSet,
    /// Also permit the key pair's own address.
    pub add_address_as_permitted: bool,
    /// Make the key pair own its own token.
    pub send_to_self: bool,
    /// Value sent with the transaction.
    pub value: Amount,
}

impl MintRequest {
    /// The request the protocol always makes: a secp256k1 key that owns and
    /// permits itself, paid at `mint_cost`.
    pub fn new(bindings: BindingSet, mint_cost: Amount) -> Self {
        Self {
            key_type: KeyType::EcdsaSecp256k1,
            bindings,
            add_address_as_permitted: true,
            send_to_self: true,
            value: mint_cost,
        }
    }

    /// The `(type word, id, scope)` entries the ledger records for the
    /// request's bindings.
    pub fn permitted_auth_methods(&self) -> Vec<PermittedAuthMethod> {
        self.bindings.permitted_auth_methods()
    }
}

/// The opaque ledger operations the protocol relies on.
///
/// Every call is a single attempt and may be long-latency; writes resolve
/// only once finalized.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current price of minting a key pair.
    async fn read_mint_cost(&self) -> Result<Amount, LedgerError>;

    /// Submit `request` and wait for finality.
    async fn mint_and_bind(&self, request: MintRequest) -> Result<TransactionReceipt, LedgerError>;

    /// The address the ledger holds for `token`.
    async fn read_address_for_token(&self, token: &TokenId) -> Result<Address, LedgerError>;

    /// Whether `method_type`/`method_id` is bound to `token`.
    async fn is_permitted_auth_method(
        &self,
        token: &TokenId,
        method_type: &AuthMethodType,
        method_id: &[u8],
    ) -> Result<bool, LedgerError>;

    /// Mint a fresh capacity grant owned by the calling account.
    async fn mint_capacity_grant(&self, params: CapacityParams) -> Result<GrantId, LedgerError>;

    /// Look up a capacity grant.
    async fn read_capacity_grant(&self, grant: GrantId)
    -> Result<Option<GrantRecord>, LedgerError>;
}

#[async_trait]
impl<L> Ledger for Arc<L>
where
    L: Ledger + ?Sized,
{
    async fn read_mint_cost(&self) -> Result<Amount, LedgerError> {
        (**self).read_mint_cost().await
    }

    async fn mint_and_bind(&self, request: MintRequest) -> Result<TransactionReceipt, LedgerError> {
        (**self).mint_and_bind(request).await
    }

    async fn read_address_for_token(&self, token: &TokenId) -> Result<Address, LedgerError> {
        (**self).read_address_for_token(token).await
    }

    async fn is_permitted_auth_method(
        &self,
        token: &TokenId,
        method_type: &AuthMethodType,
        method_id: &[u8],
    ) -> Result<bool, LedgerError> {
        (**self)
            .is_permitted_auth_method(token, method_type, method_id)
            .await
    }

    async fn mint_capacity_grant(&self, params: CapacityParams) -> Result<GrantId, LedgerError> {
        (**self).mint_capacity_grant(params).await
    }

    async fn read_capacity_grant(
        &self,
        grant: GrantId,
    ) -> Result<Option<GrantRecord>, LedgerError> {
        (**self).read_capacity_grant(grant).await
    }
}
