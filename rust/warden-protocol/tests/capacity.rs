//! Capacity delegation and its accounting on the network.

mod common;

use common::{Harness, OCTOCAT, OCTOCAT_TOKEN};
use pretty_assertions::assert_eq;
use testresult::TestResult;
use warden_common::Clock;
use warden_identity::ExternalIdentityDescriptor;
use warden_ledger::{CapacityParams, GrantId, KeyPairRecord, Ledger};
use warden_policy::PolicyParams;
use warden_protocol::{
    CapacityConfig, CapacityDelegationGrant, PkpResource, ProtocolError, ResourceAbilityRequest,
    SESSION_TTL, SessionCredential, SessionRequest, SigningNetwork,
};

async fn mint(harness: &Harness) -> Result<KeyPairRecord, common::Error> {
    Ok(harness
        .registrar()
        .mint(&ExternalIdentityDescriptor::github(OCTOCAT))
        .await?)
}

async fn open_session(
    harness: &Harness,
    key: &KeyPairRecord,
    capacity: &CapacityDelegationGrant,
) -> Result<SessionCredential, ProtocolError> {
    let assertion = harness.assert_identity(OCTOCAT, OCTOCAT_TOKEN);
    harness.broker().issue_session(&assertion, key, capacity).await
}

fn denial<T: std::fmt::Debug>(result: Result<T, ProtocolError>) -> String {
    match result {
        Err(ProtocolError::AuthorizationDenied { reason }) => reason,
        other => panic!("expected an authorization denial, got {other:?}"),
    }
}

#[tokio::test]
async fn it_mints_a_grant_with_default_parameters() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;

    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;
    assert_eq!(capacity.delegatee, key.address);
    assert_eq!(capacity.uses_remaining, 1);

    let record = harness
        .ledger
        .read_capacity_grant(capacity.grant_id)
        .await?
        .ok_or("grant was not recorded")?;
    assert_eq!(record.owner, *harness.ledger.account());
    assert_eq!(record.requests_per_kilosecond, 10);
    assert_eq!(capacity.expires_at, record.expires_at);
    Ok(())
}

#[tokio::test]
async fn it_spends_one_use_per_session() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;

    open_session(&harness, &key, &capacity).await?;
    assert_eq!(harness.network.remaining_uses(&capacity.proof).await, Some(0));
    assert_eq!(
        denial(open_session(&harness, &key, &capacity).await),
        "capacity exhausted"
    );
    Ok(())
}

#[tokio::test]
async fn it_honours_every_delegated_use() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default().with_uses(2))
        .obtain_grant(&key.address)
        .await?;

    open_session(&harness, &key, &capacity).await?;
    open_session(&harness, &key, &capacity).await?;
    assert_eq!(
        denial(open_session(&harness, &key, &capacity).await),
        "capacity exhausted"
    );
    Ok(())
}

#[tokio::test]
async fn it_grants_a_single_use_to_exactly_one_racing_session() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;

    let (first, second) = tokio::join!(
        open_session(&harness, &key, &capacity),
        open_session(&harness, &key, &capacity),
    );
    let issued = [first.is_ok(), second.is_ok()]
        .into_iter()
        .filter(|ok| *ok)
        .count();
    assert_eq!(issued, 1);
    Ok(())
}

#[tokio::test]
async fn it_does_not_spend_capacity_on_a_rejected_session() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;

    let stale = harness.assert_identity(OCTOCAT, OCTOCAT_TOKEN);
    harness.advance(600);
    let result = harness.broker().issue_session(&stale, &key, &capacity).await;
    assert_eq!(denial(result), "assertion expired");

    assert_eq!(harness.network.remaining_uses(&capacity.proof).await, Some(1));
    open_session(&harness, &key, &capacity).await?;
    Ok(())
}

#[tokio::test]
async fn it_uses_a_provided_grant_without_minting() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let grant_id = harness
        .ledger
        .mint_capacity_grant(CapacityParams::default())
        .await?;

    let capacity = harness
        .issuer(CapacityConfig::default().with_grant(grant_id))
        .obtain_grant(&key.address)
        .await?;
    assert_eq!(capacity.grant_id, grant_id);

    let next = GrantId::new(grant_id.get() + 1);
    assert_eq!(harness.ledger.read_capacity_grant(next).await?, None);

    open_session(&harness, &key, &capacity).await?;
    Ok(())
}

#[tokio::test]
async fn it_reports_an_unknown_grant_as_an_issuance_failure() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;

    let result = harness
        .issuer(CapacityConfig::default().with_grant(GrantId::new(9_999)))
        .obtain_grant(&key.address)
        .await;
    assert!(matches!(result, Err(ProtocolError::SessionIssuance(_))));
    Ok(())
}

#[tokio::test]
async fn it_refuses_a_delegation_once_the_grant_expires() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default().with_uses(5))
        .obtain_grant(&key.address)
        .await?;

    open_session(&harness, &key, &capacity).await?;

    // Grants expire at the next UTC midnight.
    harness.advance(86_400 - 3_600);
    assert_eq!(
        denial(open_session(&harness, &key, &capacity).await),
        "capacity delegation expired"
    );
    Ok(())
}

#[tokio::test]
async fn it_refuses_capacity_delegated_to_another_key() -> TestResult {
    let harness = Harness::new().await?;
    let alice = mint(&harness).await?;
    let bob = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&alice.address)
        .await?;

    assert_eq!(
        denial(open_session(&harness, &bob, &capacity).await),
        "no capacity delegation for this key pair"
    );
    Ok(())
}

#[tokio::test]
async fn it_looks_past_a_spent_delegation_to_a_usable_one() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let spent = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;
    let fresh = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;
    open_session(&harness, &key, &spent).await?;

    let assertion = harness.assert_identity(OCTOCAT, OCTOCAT_TOKEN);
    let request = SessionRequest {
        pkp_public_key: key.public_key.clone(),
        capability_proofs: vec![spent.proof.clone(), fresh.proof.clone()],
        policy: harness.policy.to_base64()?,
        policy_params: PolicyParams::new(&assertion, key.token_id)?,
        resource_ability_requests: vec![ResourceAbilityRequest::pkp_signing(
            PkpResource::wildcard(),
        )],
        expires_at: harness.clock.now() + SESSION_TTL,
    };
    harness.network.issue_session_sigs(request).await?;

    assert_eq!(harness.network.remaining_uses(&spent.proof).await, Some(0));
    assert_eq!(harness.network.remaining_uses(&fresh.proof).await, Some(0));
    Ok(())
}

#[tokio::test]
async fn it_limits_signatures_to_the_grant_rate() -> TestResult {
    let harness = Harness::new().await?;
    let key = mint(&harness).await?;
    let capacity = harness
        .issuer(CapacityConfig::default().with_rate(2))
        .obtain_grant(&key.address)
        .await?;
    let session = open_session(&harness, &key, &capacity).await?;
    let executor = harness.executor();

    executor.sign(&session, &key, "one").await?;
    executor.sign(&session, &key, "two").await?;
    match executor.sign(&session, &key, "three").await {
        Err(ProtocolError::Signing(reason)) => {
            assert!(reason.contains("capacity rate limit exceeded"));
        }
        other => panic!("expected a rate limit refusal, got {other:?}"),
    }

    // The next 1000-second window opens 400 seconds after the harness epoch.
    harness.advance(400);
    executor.sign(&session, &key, "three").await?;
    Ok(())
}
