//! Time-stamped claims of external identity.

use crate::{ExternalIdentityDescriptor, IdentityError};
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_common::{Duration, Timestamp};

/// Oldest an assertion may be when the policy engine evaluates it.
pub const MAX_ASSERTION_AGE: Duration = Duration::from_secs(600);

/// The identity providers an assertion can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityProviderKind {
    /// github.com accounts, identified by numeric user id.
    #[serde(rename = "github")]
    GitHub,
}

impl IdentityProviderKind {
    /// The stable lowercase name used in auth method ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProviderKind::GitHub => "github",
        }
    }
}

impl fmt::Display for IdentityProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An OAuth bearer token. Never rendered by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for placing in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// A claim that the holder of `bearer_token` is `subject_id` at `provider`,
/// made at `asserted_at`.
///
/// The core consumes assertions but never produces them from scratch: they
/// come out of [`crate::Authenticator`] and live only for one protocol run.
/// The serialized form (camelCase JSON) is what travels to the signing
/// network as a policy parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAssertion {
    /// Who vouches for the identity.
    pub provider: IdentityProviderKind,
    /// The provider's stable numeric user id.
    pub subject_id: u64,
    /// Human-readable name, if the provider offered one.
    pub display_name: Option<String>,
    /// When the identity was established.
    pub asserted_at: Timestamp,
    /// The token the policy engine re-verifies with the provider.
    pub bearer_token: BearerToken,
}

impl IdentityAssertion {
    /// A GitHub assertion.
    pub fn github(
        subject_id: u64,
        display_name: Option<String>,
        asserted_at: Timestamp,
        bearer_token: BearerToken,
    ) -> Self {
        Self {
            provider: IdentityProviderKind::GitHub,
            subject_id,
            display_name,
            asserted_at,
            bearer_token,
        }
    }

    /// How old the assertion is at `now`.
    pub fn age_at(&self, now: Timestamp) -> Duration {
        now.elapsed_since(self.asserted_at)
    }

    /// Whether the assertion is strictly younger than `max_age` at `now`.
    pub fn is_fresh_at(&self, now: Timestamp, max_age: Duration) -> bool {
        self.age_at(now) < max_age
    }

    /// The stable descriptor of the identity this assertion claims.
    pub fn descriptor(&self) -> ExternalIdentityDescriptor {
        ExternalIdentityDescriptor {
            provider: self.provider,
            subject_id: self.subject_id,
        }
    }

    /// Serialize for transport as a policy parameter.
    pub fn to_json(&self) -> Result<String, IdentityError> {
        serde_json::to_string(self).map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    /// Decode the transport form.
    pub fn from_json(value: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(value).map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}
