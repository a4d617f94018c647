//! The relay and GitHub clients against a mock HTTP server.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use testresult::TestResult;
use warden_common::{ManualClock, Timestamp};
use warden_identity::{
    Authenticator, BearerToken, GitHubClient, GitHubConfig, IdentityError, IdentityProvider,
    IdentityProviderKind, RelayConfig, TokenExchangeClient,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn relay(server: &MockServer) -> TokenExchangeClient {
    TokenExchangeClient::new(RelayConfig::new(server.uri()))
}

fn github(server: &MockServer) -> GitHubClient {
    GitHubClient::new(GitHubConfig::new(server.uri()).with_user_agent("warden-tests"))
}

#[tokio::test]
async fn it_exchanges_a_code_for_a_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token-exchange"))
        .and(body_json(serde_json::json!({ "code": "abc" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "gho_1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = relay(&server).exchange("abc").await?;
    assert_eq!(token.expose(), "gho_1");
    Ok(())
}

#[tokio::test]
async fn it_surfaces_the_oauth_error_description() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token-exchange"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .mount(&server)
        .await;

    match relay(&server).exchange("stale").await {
        Err(IdentityError::TokenExchange(detail)) => {
            assert_eq!(detail, "The code passed is incorrect or expired.");
        }
        other => panic!("expected a token exchange error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn it_reports_a_missing_access_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token-exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let result = relay(&server).exchange("abc").await;
    assert!(matches!(result, Err(IdentityError::MissingAccessToken)));
    assert_eq!(
        result.err().map(|e| e.to_string()),
        Some("no access token received".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn it_resolves_a_github_user() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_1"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .and(header("user-agent", "warden-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 12345,
            "login": "octocat",
            "name": null,
            "public_repos": 8
        })))
        .mount(&server)
        .await;

    let profile = github(&server).whoami(&BearerToken::new("gho_1")).await?;
    assert_eq!(profile.id, 12345);
    assert_eq!(profile.display_name(), "octocat");
    Ok(())
}

#[tokio::test]
async fn it_maps_a_refused_token_to_invalid_access_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = github(&server).whoami(&BearerToken::new("revoked")).await;
    assert!(matches!(
        result,
        Err(IdentityError::InvalidAccessToken { status: 401 })
    ));
    Ok(())
}

#[tokio::test]
async fn it_stamps_assertions_with_the_clock() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token-exchange"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "gho_2" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42,
            "login": "hubot",
            "name": "Hubot"
        })))
        .mount(&server)
        .await;

    let clock = ManualClock::new(Timestamp::from_unix(1_700_000_000));
    let authenticator = Authenticator::new(relay(&server), github(&server), Arc::new(clock));
    let assertion = authenticator.authenticate("code").await?;

    assert_eq!(assertion.provider, IdentityProviderKind::GitHub);
    assert_eq!(assertion.subject_id, 42);
    assert_eq!(assertion.display_name.as_deref(), Some("Hubot"));
    assert_eq!(assertion.asserted_at, Timestamp::from_unix(1_700_000_000));
    assert_eq!(assertion.bearer_token.expose(), "gho_2");
    Ok(())
}
