use crate::{Connection, ProtocolError};
use tracing::info;
use warden_identity::ExternalIdentityDescriptor;
use warden_ledger::{
    AuthMethodBinding, BindingSet, KeyPairRecord, Ledger, LedgerError, MintRequest,
    MintedKeyEvent, TokenId,
};
use warden_policy::PolicyDescriptor;

/// Mints key pairs bound to an external identity.
///
/// Each key pair is minted with exactly two auth methods: the policy, bound
/// with sign-anything scope, and the identity, bound with no scope of its
/// own so that it can only ever be used through the policy.
pub struct KeyRegistrar<L> {
    ledger: Connection<L>,
    policy: PolicyDescriptor,
}

impl<L> KeyRegistrar<L>
where
    L: Ledger + 'static,
{
    /// A registrar binding key pairs to `policy`.
    pub fn new(ledger: Connection<L>, policy: PolicyDescriptor) -> Self {
        Self { ledger, policy }
    }

    /// Mint a new key pair usable by `identity`.
    ///
    /// Not idempotent: every call mints an independent key pair. Ledger
    /// failures end the attempt; nothing is retried.
    pub async fn mint(
        &self,
        identity: &ExternalIdentityDescriptor,
    ) -> Result<KeyPairRecord, ProtocolError> {
        let policy_id = self
            .policy
            .id()
            .map_err(|error| ProtocolError::Configuration(error.to_string()))?;

        let bindings = BindingSet::new(vec![
            AuthMethodBinding::policy_script(policy_id.as_bytes().as_slice()),
            AuthMethodBinding::external_identity(
                self.policy.identity_method_type(),
                identity.method_id(),
            ),
        ])?;

        let ledger = self.ledger.get().await?;
        let mint_cost = ledger.read_mint_cost().await?;

        info!(
            provider = %identity.provider,
            subject_id = identity.subject_id,
            %policy_id,
            %mint_cost,
            "Minting key pair"
        );
        let receipt = ledger
            .mint_and_bind(MintRequest::new(bindings, mint_cost))
            .await?;

        let MintedKeyEvent { public_key } = MintedKeyEvent::find(&receipt)?;
        let token_id = TokenId::from_public_key(&public_key);
        let address = ledger.read_address_for_token(&token_id).await?;

        if address != public_key.address() {
            return Err(LedgerError::EventDecode(format!(
                "ledger reports address {address} for a key controlling {}",
                public_key.address()
            ))
            .into());
        }

        info!(token = %token_id, %address, "Minted key pair");
        Ok(KeyPairRecord {
            token_id,
            public_key,
            address,
        })
    }
}
