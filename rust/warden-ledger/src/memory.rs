//! An in-process ledger for tests and simulation.

use crate::{
    Amount, AuthMethodType, CapacityParams, GrantId, GrantRecord, Ledger, LedgerError,
    MintRequest, MintedKeyEvent, PermittedAuthMethod, TokenId, TransactionReceipt,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use warden_common::{Clock, Keccak256Hash};
use warden_credentials::{Address, PublicKey, Secp256k1Signer};

/// Balance a fresh [`MemoryLedger`] account starts with.
pub const DEFAULT_BALANCE: Amount = Amount::new(1_000_000_000_000_000_000);

/// Mint cost a fresh [`MemoryLedger`] charges.
pub const DEFAULT_MINT_COST: Amount = Amount::new(1_000_000_000_000_000);

/// Key material held on behalf of an in-process signing network.
///
/// In a real deployment the network generates keys by distributed key
/// generation and no single party holds them. Here one process plays every
/// node, so minted keys live in this table keyed by token id. Clones share
/// the same table.
#[derive(Debug, Clone, Default)]
pub struct KeyCustody {
    keys: Arc<RwLock<HashMap<TokenId, Secp256k1Signer>>>,
}

impl KeyCustody {
    /// An empty custody table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and retain a new key, returning its public half.
    pub async fn generate(&self) -> Result<PublicKey, LedgerError> {
        let signer = Secp256k1Signer::generate()
            .map_err(|error| LedgerError::Reverted(format!("key generation failed: {error}")))?;
        let public_key = signer.public_key().clone();
        self.keys
            .write()
            .await
            .insert(TokenId::from_public_key(&public_key), signer);
        Ok(public_key)
    }

    /// The signer for `token`, if this custody minted it.
    pub async fn signer(&self, token: &TokenId) -> Option<Secp256k1Signer> {
        self.keys.read().await.get(token).cloned()
    }
}

#[derive(Debug)]
struct TokenEntry {
    address: Address,
    owner: Address,
    auth_methods: Vec<PermittedAuthMethod>,
    permitted_addresses: Vec<Address>,
}

#[derive(Debug)]
struct LedgerState {
    balance: Amount,
    mint_cost: Amount,
    tokens: HashMap<TokenId, TokenEntry>,
    grants: HashMap<GrantId, GrantRecord>,
    next_grant: u64,
    transactions: u64,
}

impl LedgerState {
    fn next_transaction_hash(&mut self, kind: &[u8]) -> Keccak256Hash {
        self.transactions += 1;
        Keccak256Hash::hash_iter([kind, self.transactions.to_be_bytes().as_slice()])
    }
}

/// A [`Ledger`] kept in memory, paid for by a single funded account.
///
/// Clones share the same state, so a registrar and a signing network can
/// each hold one.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use warden_common::SystemClock;
/// use warden_credentials::Address;
/// use warden_ledger::{Ledger, MemoryLedger, DEFAULT_MINT_COST};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = MemoryLedger::new(Address::new([1; 20]), Arc::new(SystemClock));
/// assert_eq!(ledger.read_mint_cost().await?, DEFAULT_MINT_COST);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryLedger {
    account: Address,
    custody: KeyCustody,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// A ledger whose transactions are paid by `account`.
    pub fn new(account: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            account,
            custody: KeyCustody::new(),
            clock,
            state: Arc::new(RwLock::new(LedgerState {
                balance: DEFAULT_BALANCE,
                mint_cost: DEFAULT_MINT_COST,
                tokens: HashMap::new(),
                grants: HashMap::new(),
                next_grant: 1,
                transactions: 0,
            })),
        }
    }

    /// The paying account.
    pub fn account(&self) -> &Address {
        &self.account
    }

    /// The clock grant expiries are computed against.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Keys minted through this ledger.
    pub fn custody(&self) -> &KeyCustody {
        &self.custody
    }

    /// The paying account's balance.
    pub async fn balance(&self) -> Amount {
        self.state.read().await.balance
    }

    /// Set the paying account's balance.
    pub async fn set_balance(&self, balance: Amount) {
        self.state.write().await.balance = balance;
    }

    /// Set the price of minting a key pair.
    pub async fn set_mint_cost(&self, cost: Amount) {
        self.state.write().await.mint_cost = cost;
    }

    /// Record a grant minted outside this ledger, such as one handed to an
    /// operator out of band. Later mints never reuse its id.
    pub async fn insert_capacity_grant(&self, record: GrantRecord) {
        let mut state = self.state.write().await;
        state.next_grant = state.next_grant.max(record.grant_id.get() + 1);
        debug!(grant_id = %record.grant_id, "Recorded capacity grant");
        state.grants.insert(record.grant_id, record);
    }

    /// The owner of `token`.
    pub async fn owner_of(&self, token: &TokenId) -> Result<Address, LedgerError> {
        self.state
            .read()
            .await
            .tokens
            .get(token)
            .map(|entry| entry.owner)
            .ok_or_else(|| LedgerError::UnknownToken(token.to_string()))
    }

    /// Whether `address` is a permitted controller of `token`.
    pub async fn is_permitted_address(&self, token: &TokenId, address: &Address) -> bool {
        self.state
            .read()
            .await
            .tokens
            .get(token)
            .is_some_and(|entry| entry.permitted_addresses.contains(address))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn read_mint_cost(&self) -> Result<Amount, LedgerError> {
        Ok(self.state.read().await.mint_cost)
    }

    async fn mint_and_bind(&self, request: MintRequest) -> Result<TransactionReceipt, LedgerError> {
        let mut state = self.state.write().await;

        if request.value < state.mint_cost {
            return Err(LedgerError::Reverted(format!(
                "mint value {} is below mint cost {}",
                request.value, state.mint_cost
            )));
        }
        if state.balance < request.value {
            return Err(LedgerError::InsufficientFunds {
                balance: state.balance.get(),
                required: request.value.get(),
            });
        }

        let public_key = self.custody.generate().await?;
        let token = TokenId::from_public_key(&public_key);
        let address = public_key.address();

        state.balance = Amount::new(state.balance.get() - request.value.get());
        state.tokens.insert(
            token,
            TokenEntry {
                address,
                owner: if request.send_to_self {
                    address
                } else {
                    self.account
                },
                auth_methods: request.permitted_auth_methods(),
                permitted_addresses: if request.add_address_as_permitted {
                    vec![address]
                } else {
                    Vec::new()
                },
            },
        );

        let transaction_hash = state.next_transaction_hash(b"mint");
        debug!(%token, %address, %transaction_hash, "Minted key pair");

        Ok(TransactionReceipt {
            transaction_hash,
            logs: vec![MintedKeyEvent { public_key }.to_log_entry()],
        })
    }

    async fn read_address_for_token(&self, token: &TokenId) -> Result<Address, LedgerError> {
        self.state
            .read()
            .await
            .tokens
            .get(token)
            .map(|entry| entry.address)
            .ok_or_else(|| LedgerError::UnknownToken(token.to_string()))
    }

    async fn is_permitted_auth_method(
        &self,
        token: &TokenId,
        method_type: &AuthMethodType,
        method_id: &[u8],
    ) -> Result<bool, LedgerError> {
        Ok(self
            .state
            .read()
            .await
            .tokens
            .get(token)
            .is_some_and(|entry| entry
                .auth_methods
                .iter()
                .any(|method| method.matches(method_type, method_id))))
    }

    async fn mint_capacity_grant(&self, params: CapacityParams) -> Result<GrantId, LedgerError> {
        if params.requests_per_kilosecond == 0 {
            return Err(LedgerError::Reverted(
                "requests per kilosecond must be positive".into(),
            ));
        }
        if params.days_until_expiration == 0 {
            return Err(LedgerError::Reverted(
                "expiration must be at least one day out".into(),
            ));
        }

        let mut state = self.state.write().await;
        let grant_id = GrantId::new(state.next_grant);
        state.next_grant += 1;
        state.grants.insert(
            grant_id,
            GrantRecord {
                grant_id,
                owner: self.account,
                requests_per_kilosecond: params.requests_per_kilosecond,
                expires_at: params.expiry_from(self.clock.now()),
            },
        );
        state.next_transaction_hash(b"capacity");
        debug!(%grant_id, "Minted capacity grant");

        Ok(grant_id)
    }

    async fn read_capacity_grant(
        &self,
        grant: GrantId,
    ) -> Result<Option<GrantRecord>, LedgerError> {
        Ok(self.state.read().await.grants.get(&grant).cloned())
    }
}
