//! End-to-end protocol runs against the in-process network.

mod common;

use common::{Harness, OCTOCAT, OCTOCAT_TOKEN};
use pretty_assertions::assert_eq;
use testresult::TestResult;
use warden_identity::ExternalIdentityDescriptor;
use warden_protocol::{CapacityConfig, ProtocolError};

#[tokio::test]
async fn it_issues_a_session_only_while_the_assertion_is_fresh() -> TestResult {
    let harness = Harness::new().await?;
    let key = harness
        .registrar()
        .mint(&ExternalIdentityDescriptor::github(OCTOCAT))
        .await?;
    let assertion = harness.assert_identity(OCTOCAT, OCTOCAT_TOKEN);
    let issuer = harness.issuer(CapacityConfig::default());

    harness.advance(60);
    let capacity = issuer.obtain_grant(&key.address).await?;
    let session = harness
        .broker()
        .issue_session(&assertion, &key, &capacity)
        .await?;
    assert_eq!(session.pkp_public_key, key.public_key);

    harness.advance(640);
    let capacity = issuer.obtain_grant(&key.address).await?;
    let result = harness
        .broker()
        .issue_session(&assertion, &key, &capacity)
        .await;

    match result {
        Err(ProtocolError::AuthorizationDenied { reason }) => {
            assert_eq!(reason, "assertion expired");
        }
        other => panic!("expected the stale assertion to be denied, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn it_signs_hello_world_verifiably() -> TestResult {
    let harness = Harness::new().await?;
    let key = harness
        .registrar()
        .mint(&ExternalIdentityDescriptor::github(OCTOCAT))
        .await?;
    let assertion = harness.assert_identity(OCTOCAT, OCTOCAT_TOKEN);
    let capacity = harness
        .issuer(CapacityConfig::default())
        .obtain_grant(&key.address)
        .await?;
    let session = harness
        .broker()
        .issue_session(&assertion, &key, &capacity)
        .await?;

    let result = harness.executor().sign(&session, &key, "hello world").await?;
    assert_eq!(result.verify_for(&key)?, key.address);

    let mut tampered = result;
    tampered.signature.s[31] ^= 0x01;
    assert!(matches!(
        tampered.verify_for(&key),
        Err(ProtocolError::SignatureVerificationFailure { .. })
    ));
    Ok(())
}
