//! `warden login` against mocked relay and GitHub endpoints.

use pretty_assertions::assert_eq;
use testresult::TestResult;
use warden_cli::{LoginArgs, login};
use warden_identity::ExternalIdentityDescriptor;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn it_describes_the_identity_without_the_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token-exchange"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "gho_octocat",
            })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 12345,
            "login": "octocat",
            "name": "The Octocat",
        })))
        .mount(&server)
        .await;

    let value = login(LoginArgs {
        code: "abc".into(),
        relay_url: Some(server.uri()),
        github_api_url: server.uri(),
        timeout: 5,
    })
    .await?;

    assert_eq!(value["subjectId"], 12345);
    assert_eq!(value["displayName"], "The Octocat");
    assert_eq!(
        value["authMethodId"],
        serde_json::json!(ExternalIdentityDescriptor::github(12345).method_id())
    );
    assert!(!value.to_string().contains("gho_octocat"));
    Ok(())
}

#[tokio::test]
async fn it_needs_a_relay() {
    let result = login(LoginArgs {
        code: "abc".into(),
        relay_url: None,
        github_api_url: "http://127.0.0.1:9".into(),
        timeout: 5,
    })
    .await;
    assert!(result.is_err());
}
