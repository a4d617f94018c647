//! Authorization code exchange through a stateless relay.

use crate::{BearerToken, IdentityError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for [`TokenExchangeClient`].
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Base URL of the relay
    pub endpoint: String,

    /// Route the relay serves the exchange on (default: `token-exchange`)
    pub path: String,

    /// Optional timeout for requests in seconds (default: 30)
    pub timeout_seconds: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787".to_string(),
            path: "token-exchange".to_string(),
            timeout_seconds: Some(30),
        }
    }
}

impl RelayConfig {
    /// Create a configuration for the relay at `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Serve the exchange from a different route
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges OAuth authorization codes for bearer tokens.
///
/// The relay holds the OAuth client secret and keeps no state, so a code
/// can be exchanged at most once and the client never sees the secret.
#[derive(Clone, Debug)]
pub struct TokenExchangeClient {
    config: RelayConfig,
    client: Client,
}

impl TokenExchangeClient {
    /// Create a client for the configured relay
    pub fn new(config: RelayConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let client = client_builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.path.trim_start_matches('/')
        )
    }

    /// Trade `code` for a bearer token.
    ///
    /// An OAuth error reported by the relay surfaces as
    /// [`IdentityError::TokenExchange`] carrying its description; a response
    /// with neither token nor error is [`IdentityError::MissingAccessToken`].
    pub async fn exchange(&self, code: &str) -> Result<BearerToken, IdentityError> {
        if code.is_empty() {
            return Err(IdentityError::MissingCode);
        }

        let response = self
            .client
            .post(self.url())
            .json(&ExchangeRequest { code })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = match response.json::<ExchangeResponse>().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(IdentityError::TokenExchange(format!(
                    "HTTP {} - {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )));
            }
            Err(e) => return Err(IdentityError::UnexpectedResponse(e.to_string())),
        };

        if let Some(error) = body.error {
            debug!(%error, "relay reported an OAuth error");
            return Err(IdentityError::TokenExchange(
                body.error_description.unwrap_or(error),
            ));
        }

        if !status.is_success() {
            return Err(IdentityError::TokenExchange(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        body.access_token
            .filter(|token| !token.is_empty())
            .map(BearerToken::new)
            .ok_or(IdentityError::MissingAccessToken)
    }
}
