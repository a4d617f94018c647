//! The in-memory ledger's bookkeeping.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use testresult::TestResult;
use warden_common::{Keccak256Hash, ManualClock, Timestamp};
use warden_credentials::Address;
use warden_ledger::{
    Amount, AuthMethodBinding, AuthMethodType, BindingSet, CapacityParams, DEFAULT_BALANCE,
    GrantId, GrantRecord, KeyPairRecord, Ledger, LedgerError, MemoryLedger, MintRequest,
    MintedKeyEvent,
};

const NOON: u64 = 20_000 * 86_400 + 43_200;

fn ledger() -> MemoryLedger {
    MemoryLedger::new(
        Address::new([0xaa; 20]),
        Arc::new(ManualClock::new(Timestamp::from_unix(NOON))),
    )
}

fn namespace() -> Keccak256Hash {
    Keccak256Hash::hash(b"Example Auth v1")
}

fn bindings() -> Result<BindingSet, LedgerError> {
    BindingSet::new(vec![
        AuthMethodBinding::policy_script(vec![0x12, 0x20, 0xab]),
        AuthMethodBinding::external_identity(namespace(), Keccak256Hash::hash(b"github:12345")),
    ])
}

#[tokio::test]
async fn it_mints_a_key_pair_and_records_its_bindings() -> TestResult {
    let ledger = ledger();
    let cost = ledger.read_mint_cost().await?;
    let receipt = ledger.mint_and_bind(MintRequest::new(bindings()?, cost)).await?;

    let event = MintedKeyEvent::find(&receipt)?;
    let record = KeyPairRecord::from_public_key(event.public_key);

    assert_eq!(
        ledger.read_address_for_token(&record.token_id).await?,
        record.address
    );
    assert!(
        ledger
            .is_permitted_auth_method(
                &record.token_id,
                &AuthMethodType::ExternalIdentity {
                    namespace: namespace()
                },
                Keccak256Hash::hash(b"github:12345").as_slice(),
            )
            .await?
    );
    assert!(
        !ledger
            .is_permitted_auth_method(
                &record.token_id,
                &AuthMethodType::ExternalIdentity {
                    namespace: namespace()
                },
                Keccak256Hash::hash(b"github:54321").as_slice(),
            )
            .await?
    );
    assert_eq!(ledger.owner_of(&record.token_id).await?, record.address);
    assert!(
        ledger
            .is_permitted_address(&record.token_id, &record.address)
            .await
    );
    assert_eq!(
        ledger.balance().await,
        Amount::new(DEFAULT_BALANCE.get() - cost.get())
    );
    assert!(ledger.custody().signer(&record.token_id).await.is_some());
    Ok(())
}

#[tokio::test]
async fn it_mints_independent_key_pairs_for_the_same_bindings() -> TestResult {
    let ledger = ledger();
    let cost = ledger.read_mint_cost().await?;
    let first = MintedKeyEvent::find(&ledger.mint_and_bind(MintRequest::new(bindings()?, cost)).await?)?;
    let second = MintedKeyEvent::find(&ledger.mint_and_bind(MintRequest::new(bindings()?, cost)).await?)?;
    assert_ne!(first.public_key, second.public_key);
    Ok(())
}

#[tokio::test]
async fn it_reverts_an_underpaid_mint() -> TestResult {
    let ledger = ledger();
    let result = ledger
        .mint_and_bind(MintRequest::new(bindings()?, Amount::new(1)))
        .await;
    assert!(matches!(result, Err(LedgerError::Reverted(_))));
    assert_eq!(ledger.balance().await, DEFAULT_BALANCE);
    Ok(())
}

#[tokio::test]
async fn it_refuses_a_mint_the_account_cannot_pay_for() -> TestResult {
    let ledger = ledger();
    ledger.set_balance(Amount::new(10)).await;
    let cost = ledger.read_mint_cost().await?;
    let result = ledger.mint_and_bind(MintRequest::new(bindings()?, cost)).await;
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientFunds { balance: 10, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn it_mints_capacity_grants_expiring_at_midnight() -> TestResult {
    let ledger = ledger();
    let grant = ledger
        .mint_capacity_grant(CapacityParams {
            requests_per_kilosecond: 10,
            days_until_expiration: 2,
        })
        .await?;

    let record = ledger.read_capacity_grant(grant).await?;
    let record = record.ok_or("grant should be recorded")?;
    assert_eq!(record.owner, *ledger.account());
    assert_eq!(record.expires_at, Timestamp::from_unix(20_002 * 86_400));
    assert_eq!(ledger.read_capacity_grant(GrantId::new(999)).await?, None);
    Ok(())
}

#[tokio::test]
async fn it_reports_unknown_tokens() -> TestResult {
    let ledger = ledger();
    let token = Keccak256Hash::hash(b"nobody").into();
    assert!(matches!(
        ledger.read_address_for_token(&token).await,
        Err(LedgerError::UnknownToken(_))
    ));
    Ok(())
}

#[tokio::test]
async fn it_submits_bindings_as_type_words() -> TestResult {
    let ledger = ledger();
    let request = MintRequest::new(bindings()?, ledger.read_mint_cost().await?);
    let words: Vec<_> = request
        .permitted_auth_methods()
        .iter()
        .map(|method| method.type_word)
        .collect();
    assert_eq!(
        words,
        vec![
            AuthMethodType::PolicyScript.type_word(),
            *namespace().bytes()
        ]
    );

    let record = KeyPairRecord::from_public_key(
        MintedKeyEvent::find(&ledger.mint_and_bind(request).await?)?.public_key,
    );
    assert!(
        ledger
            .is_permitted_auth_method(
                &record.token_id,
                &AuthMethodType::PolicyScript,
                &[0x12, 0x20, 0xab]
            )
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn it_keeps_recorded_grants_apart_from_minted_ones() -> TestResult {
    let ledger = ledger();
    let recorded = GrantRecord {
        grant_id: GrantId::new(77),
        owner: *ledger.account(),
        requests_per_kilosecond: 5,
        expires_at: Timestamp::from_unix(20_001 * 86_400),
    };
    ledger.insert_capacity_grant(recorded.clone()).await;

    assert_eq!(
        ledger.read_capacity_grant(GrantId::new(77)).await?,
        Some(recorded)
    );
    let minted = ledger.mint_capacity_grant(CapacityParams::default()).await?;
    assert_eq!(minted, GrantId::new(78));
    Ok(())
}
