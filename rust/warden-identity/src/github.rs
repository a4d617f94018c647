//! GitHub as an [`IdentityProvider`].

use crate::{BearerToken, IdentityError, IdentityProvider, IdentityProviderKind, ProviderProfile};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

/// The public GitHub REST API.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Configuration for [`GitHubClient`].
#[derive(Clone, Debug)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    pub api_url: String,

    /// GitHub rejects requests without a `User-Agent`
    pub user_agent: String,

    /// Optional timeout for requests in seconds (default: 30)
    pub timeout_seconds: Option<u64>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            user_agent: concat!("warden/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: Some(30),
        }
    }
}

impl GitHubConfig {
    /// Point the client at a different API root, such as GitHub Enterprise.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Set the `User-Agent` header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Resolves bearer tokens to GitHub users via `GET /user`.
#[derive(Clone, Debug)]
pub struct GitHubClient {
    config: GitHubConfig,
    client: Client,
}

impl GitHubClient {
    /// Create a client with the given configuration
    pub fn new(config: GitHubConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let client = client_builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new(GitHubConfig::default())
    }
}

#[async_trait]
impl IdentityProvider for GitHubClient {
    fn kind(&self) -> IdentityProviderKind {
        IdentityProviderKind::GitHub
    }

    async fn whoami(&self, token: &BearerToken) -> Result<ProviderProfile, IdentityError> {
        let response = self
            .client
            .get(self.url("user"))
            .bearer_auth(token.expose())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "GitHub refused access token");
            return Err(IdentityError::InvalidAccessToken {
                status: status.as_u16(),
            });
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|e| IdentityError::UnexpectedResponse(e.to_string()))
    }
}
