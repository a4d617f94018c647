//! Protocol settings.

use crate::ProtocolError;
use warden_identity::{GITHUB_API_URL, GitHubConfig, RelayConfig};
use warden_ledger::{CapacityParams, GrantId};

/// Environment variable naming the signing network.
pub const NETWORK_ENV_VAR: &str = "WARDEN_NETWORK";
/// Environment variable carrying a pre-issued capacity grant id.
pub const CAPACITY_GRANT_ENV_VAR: &str = "WARDEN_CAPACITY_GRANT_ID";
/// Environment variable carrying the token exchange relay URL.
pub const RELAY_URL_ENV_VAR: &str = "WARDEN_RELAY_URL";
/// Environment variable overriding the GitHub API root.
pub const GITHUB_API_URL_ENV_VAR: &str = "WARDEN_GITHUB_API_URL";
/// Environment variable enabling per-key resource scoping.
pub const STRICT_SCOPE_ENV_VAR: &str = "WARDEN_STRICT_SCOPE";

/// How capacity is obtained and delegated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityConfig {
    /// A grant issued out of band. When set, nothing is minted.
    pub grant_id: Option<GrantId>,

    /// Rate of a freshly minted grant (default: 10)
    pub requests_per_kilosecond: u32,

    /// Lifetime of a freshly minted grant in UTC days (default: 1)
    pub days_until_expiration: u32,

    /// Uses delegated to each session (default: 1)
    pub uses_per_session: u32,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        let params = CapacityParams::default();
        Self {
            grant_id: None,
            requests_per_kilosecond: params.requests_per_kilosecond,
            days_until_expiration: params.days_until_expiration,
            uses_per_session: 1,
        }
    }
}

impl CapacityConfig {
    /// Use a pre-issued grant
    pub fn with_grant(mut self, grant_id: GrantId) -> Self {
        self.grant_id = Some(grant_id);
        self
    }

    /// Set the rate of minted grants
    pub fn with_rate(mut self, requests_per_kilosecond: u32) -> Self {
        self.requests_per_kilosecond = requests_per_kilosecond;
        self
    }

    /// Set the lifetime of minted grants
    pub fn with_days(mut self, days: u32) -> Self {
        self.days_until_expiration = days;
        self
    }

    /// Set the uses delegated per session
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_per_session = uses;
        self
    }

    /// Parameters for minting a grant.
    pub fn params(&self) -> CapacityParams {
        CapacityParams {
            requests_per_kilosecond: self.requests_per_kilosecond,
            days_until_expiration: self.days_until_expiration,
        }
    }
}

/// Where identities come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Token exchange relay. Required only for logging in.
    pub relay_url: Option<String>,

    /// GitHub REST API root (default: the public API)
    pub github_api_url: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            github_api_url: GITHUB_API_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl IdentityConfig {
    /// Set the relay URL
    pub fn with_relay(mut self, url: impl Into<String>) -> Self {
        self.relay_url = Some(url.into());
        self
    }

    /// Set the GitHub API root
    pub fn with_github_api(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Relay client settings; fails when no relay is configured.
    pub fn relay(&self) -> Result<RelayConfig, ProtocolError> {
        let url = self.relay_url.as_ref().ok_or_else(|| {
            ProtocolError::Configuration(format!("{RELAY_URL_ENV_VAR} is not set"))
        })?;
        Ok(RelayConfig::new(url.clone()).with_timeout(self.timeout_seconds))
    }

    /// GitHub client settings.
    pub fn github(&self) -> GitHubConfig {
        GitHubConfig::new(self.github_api_url.clone()).with_timeout(self.timeout_seconds)
    }
}

/// Settings for one protocol run.
///
/// ```rust
/// use warden_protocol::{CapacityConfig, ProtocolConfig};
///
/// let config = ProtocolConfig::new("datil-dev")
///     .with_capacity(CapacityConfig::default().with_uses(2))
///     .with_strict_resource_scope(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Name of the signing network.
    pub network: String,

    /// Capacity settings.
    pub capacity: CapacityConfig,

    /// Identity settings.
    pub identity: IdentityConfig,

    /// Scope sessions to the one key pair instead of every key (default: false)
    pub strict_resource_scope: bool,
}

impl ProtocolConfig {
    /// Settings for `network` with everything else defaulted.
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            capacity: CapacityConfig::default(),
            identity: IdentityConfig::default(),
            strict_resource_scope: false,
        }
    }

    /// Set the capacity settings
    pub fn with_capacity(mut self, capacity: CapacityConfig) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the identity settings
    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    /// Set whether sessions are scoped to a single key pair
    pub fn with_strict_resource_scope(mut self, strict: bool) -> Self {
        self.strict_resource_scope = strict;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.network.trim().is_empty() {
            return Err(ProtocolError::Configuration(
                "a signing network is required".into(),
            ));
        }
        if self.capacity.uses_per_session == 0 {
            return Err(ProtocolError::Configuration(
                "each session needs at least one capacity use".into(),
            ));
        }
        if self.capacity.grant_id.is_none() {
            if self.capacity.requests_per_kilosecond == 0 {
                return Err(ProtocolError::Configuration(
                    "minted capacity needs a positive rate".into(),
                ));
            }
            if self.capacity.days_until_expiration == 0 {
                return Err(ProtocolError::Configuration(
                    "minted capacity must last at least one day".into(),
                ));
            }
        }
        Ok(())
    }
}
