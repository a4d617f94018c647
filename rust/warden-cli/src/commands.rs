use crate::{Command, LoginArgs, SimulateArgs};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;
use warden_common::{Clock, Duration, ManualClock, SystemClock, Timestamp};
use warden_credentials::{Address, Secp256k1Signer};
use warden_identity::{
    Authenticator, BearerToken, ExternalIdentityDescriptor, GitHubClient, IdentityAssertion,
    ProviderProfile, StaticIdentityProvider, TokenExchangeClient, auth_method_type,
};
use warden_ledger::{GrantRecord, MemoryLedger};
use warden_policy::PolicyDescriptor;
use warden_protocol::{
    CapacityConfig, CapacityIssuer, Connection, IdentityConfig, KeyRegistrar, MemoryNetwork,
    ProtocolConfig, SessionBroker, SignatureResult, SigningExecutor, WrappedKeyManager,
    WrappedKeyNetwork,
};

/// Account that pays for and owns everything minted during a simulation.
const SIMULATION_ACCOUNT: Address = Address::new([0xda; 20]);

/// Run `command`, returning what should be printed.
pub async fn run(command: Command) -> Result<Value> {
    match command {
        Command::Login(args) => login(args).await,
        Command::MethodId {
            subject_id,
            namespace,
        } => Ok(method_id(subject_id, &namespace)),
        Command::Policy { namespace } => policy(&namespace),
        Command::Verify { address, result } => verify(&address, &result),
        Command::Simulate(args) => simulate(args).await,
    }
}

/// Exchange an authorization code and describe the identity it proves.
///
/// The bearer token itself is never printed.
pub async fn login(args: LoginArgs) -> Result<Value> {
    let mut identity = IdentityConfig::default()
        .with_github_api(args.github_api_url)
        .with_timeout(args.timeout);
    if let Some(url) = args.relay_url {
        identity = identity.with_relay(url);
    }

    let authenticator = Authenticator::new(
        TokenExchangeClient::new(identity.relay()?),
        GitHubClient::new(identity.github()),
        Arc::new(SystemClock),
    );
    let assertion = authenticator.authenticate(&args.code).await?;
    let descriptor = assertion.descriptor();

    Ok(json!({
        "provider": assertion.provider,
        "subjectId": assertion.subject_id,
        "displayName": assertion.display_name,
        "assertedAt": assertion.asserted_at,
        "authMethodId": descriptor.method_id(),
    }))
}

/// The auth method type and id binding `subject_id` under `namespace`.
pub fn method_id(subject_id: u64, namespace: &str) -> Value {
    let descriptor = ExternalIdentityDescriptor::github(subject_id);
    json!({
        "provider": descriptor.provider,
        "subjectId": descriptor.subject_id,
        "authMethodType": auth_method_type(namespace),
        "authMethodId": descriptor.method_id(),
    })
}

/// The policy descriptor for `namespace`, its content id and wire form.
pub fn policy(namespace: &str) -> Result<Value> {
    let descriptor = PolicyDescriptor::github_identity().with_namespace(namespace);
    Ok(json!({
        "id": descriptor.id()?.to_string(),
        "encoded": descriptor.to_base64()?,
        "descriptor": descriptor,
    }))
}

/// Check a JSON signature result against `address`.
pub fn verify(address: &Address, result: &str) -> Result<Value> {
    let result: SignatureResult =
        serde_json::from_str(result).context("signature result is not valid JSON")?;
    let recovered = result.verify(address)?;
    Ok(json!({
        "verified": true,
        "address": recovered,
        "dataSigned": result.data_signed,
    }))
}

/// Mint, delegate capacity, open a session and sign, all in-process.
///
/// The simulated clock starts at the current time and is moved forward by
/// `delay_secs` between signing in and asking for the session, so delays of
/// ten minutes or more show the freshness check refusing the session.
///
/// A provided `grant_id` is recorded on the simulated ledger as though it
/// had been issued out of band, and no grant is minted.
pub async fn simulate(args: SimulateArgs) -> Result<Value> {
    let mut capacity = CapacityConfig::default().with_uses(args.uses);
    if let Some(grant_id) = args.grant_id {
        capacity = capacity.with_grant(grant_id);
    }
    let config = ProtocolConfig::new(args.network)
        .with_capacity(capacity)
        .with_strict_resource_scope(args.strict_scope);
    config.validate()?;
    info!(network = %config.network, "Simulating protocol run");

    let clock = ManualClock::new(Timestamp::now());
    let ledger = MemoryLedger::new(SIMULATION_ACCOUNT, Arc::new(clock.clone()));
    if let Some(grant_id) = config.capacity.grant_id {
        ledger
            .insert_capacity_grant(GrantRecord {
                grant_id,
                owner: SIMULATION_ACCOUNT,
                requests_per_kilosecond: config.capacity.requests_per_kilosecond,
                expires_at: config.capacity.params().expiry_from(clock.now()),
            })
            .await;
    }
    let provider = StaticIdentityProvider::default();

    let signer_id = args.signer_id.unwrap_or(args.subject_id);
    let token = BearerToken::new(format!("simulated-{signer_id}"));
    let login = format!("user-{signer_id}");
    provider
        .insert(
            &token,
            ProviderProfile {
                id: signer_id,
                login: login.clone(),
                name: None,
            },
        )
        .await;

    let network = Connection::ready(MemoryNetwork::new(
        ledger.clone(),
        provider,
        Secp256k1Signer::generate()?,
    ));
    let ledger = Connection::ready(ledger);
    let policy = PolicyDescriptor::github_identity();

    let key = KeyRegistrar::new(ledger.clone(), policy.clone())
        .mint(&ExternalIdentityDescriptor::github(args.subject_id))
        .await?;

    let assertion = IdentityAssertion::github(signer_id, Some(login), clock.now(), token);
    clock.advance(Duration::from_secs(args.delay_secs));

    let capacity = CapacityIssuer::new(
        ledger,
        network.clone(),
        config.capacity.clone(),
        SIMULATION_ACCOUNT,
    )
    .obtain_grant(&key.address)
    .await?;

    let session = SessionBroker::new(network.clone(), policy, Arc::new(clock.clone()))
        .with_strict_resource_scope(config.strict_resource_scope)
        .issue_session(&assertion, &key, &capacity)
        .await?;

    let signature = SigningExecutor::new(network.clone())
        .sign(&session, &key, args.message.as_str())
        .await?;
    let recovered = signature.verify_for(&key)?;
    info!(address = %recovered, "Verified signature");

    let wrapped = WrappedKeyManager::new(network);
    let wrapped_key = wrapped
        .generate(&session, WrappedKeyNetwork::Solana, args.memo)
        .await?;
    let wrapped_signature = wrapped
        .sign(&session, &wrapped_key, args.message.as_str())
        .await?;
    wrapped_signature.verify(args.message.as_str())?;

    Ok(json!({
        "network": config.network,
        "keyPair": key,
        "capacityGrant": capacity.grant_id.to_string(),
        "sessionExpiresAt": session.expires_at,
        "signature": signature,
        "wrappedKey": wrapped_key,
        "wrappedKeySignature": wrapped_signature,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;
    use warden_ledger::GrantId;
    use warden_protocol::{ProtocolError, WrappedKeySignature};

    #[test]
    fn it_prints_the_binding_for_a_subject() {
        let value = method_id(12345, warden_identity::AUTH_METHOD_NAMESPACE);
        assert_eq!(value["provider"], "github");
        assert_eq!(value["subjectId"], 12345);
        assert_eq!(
            value["authMethodId"],
            json!(ExternalIdentityDescriptor::github(12345).method_id())
        );
    }

    #[test]
    fn it_prints_a_policy_id_that_matches_its_encoding() -> TestResult {
        let value = policy(warden_identity::AUTH_METHOD_NAMESPACE)?;
        let encoded = value["encoded"].as_str().ok_or("missing encoding")?;
        let decoded = PolicyDescriptor::from_base64(encoded)?;
        assert_eq!(value["id"], decoded.id()?.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn it_simulates_a_verifiable_signature() -> TestResult {
        let value = simulate(SimulateArgs::default()).await?;
        let address: Address = serde_json::from_value(value["keyPair"]["address"].clone())?;
        let result = serde_json::to_string(&value["signature"])?;

        let verified = verify(&address, &result)?;
        assert_eq!(verified["verified"], true);
        Ok(())
    }

    #[tokio::test]
    async fn it_simulates_with_a_provided_grant_without_minting() -> TestResult {
        let value = simulate(SimulateArgs {
            network: "datil-dev".into(),
            grant_id: Some(GrantId::new(77)),
            ..SimulateArgs::default()
        })
        .await?;
        assert_eq!(value["network"], "datil-dev");
        assert_eq!(value["capacityGrant"], "77");
        Ok(())
    }

    #[tokio::test]
    async fn it_simulates_a_wrapped_key_owned_by_the_key_pair() -> TestResult {
        let value = simulate(SimulateArgs {
            memo: "This is a test memo".into(),
            ..SimulateArgs::default()
        })
        .await?;
        assert_eq!(value["wrappedKey"]["pkpAddress"], value["keyPair"]["address"]);
        assert_eq!(value["wrappedKey"]["network"], "solana");
        assert_eq!(value["wrappedKey"]["memo"], "This is a test memo");

        let signature: WrappedKeySignature =
            serde_json::from_value(value["wrappedKeySignature"].clone())?;
        signature.verify("hello world")?;
        Ok(())
    }

    #[tokio::test]
    async fn it_simulates_a_stale_sign_in_being_refused() {
        let result = simulate(SimulateArgs {
            delay_secs: 600,
            ..SimulateArgs::default()
        })
        .await;

        let error = result.err().map(|error| error.downcast::<ProtocolError>());
        assert!(matches!(
            error,
            Some(Ok(ProtocolError::AuthorizationDenied { reason })) if reason == "assertion expired"
        ));
    }

    #[tokio::test]
    async fn it_simulates_an_unbound_identity_being_refused() {
        let result = simulate(SimulateArgs {
            signer_id: Some(42),
            ..SimulateArgs::default()
        })
        .await;

        let error = result.err().map(|error| error.downcast::<ProtocolError>());
        assert!(matches!(
            error,
            Some(Ok(ProtocolError::AuthorizationDenied { reason })) if reason == "not authorized"
        ));
    }

    #[test]
    fn it_refuses_a_signature_from_another_address() -> TestResult {
        let signer = Secp256k1Signer::import(&[7u8; 32])?;
        let digest = warden_common::Keccak256Hash::hash(b"hello world");
        let result = SignatureResult {
            data_signed: digest,
            signature: signer.sign_prehash(&digest)?,
        };
        let json = serde_json::to_string(&result)?;

        let other = Secp256k1Signer::import(&[8u8; 32])?.address();
        assert!(verify(&other, &json).is_err());
        assert!(verify(&signer.address(), &json).is_ok());
        Ok(())
    }
}
