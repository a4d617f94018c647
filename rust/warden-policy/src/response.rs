use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Why the engine refused a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The identity assertion could not be decoded.
    ParseError,
    /// The provider refused the assertion's bearer token.
    InvalidAccessToken,
    /// The token belongs to someone other than the asserted subject.
    IdentityMismatch,
    /// The assertion is too old.
    AssertionExpired,
    /// The identity is not bound to the key pair.
    NotAuthorized,
    /// A collaborator failed unexpectedly.
    Fault(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::ParseError => f.write_str("parse error"),
            RejectionReason::InvalidAccessToken => f.write_str("invalid access token"),
            RejectionReason::IdentityMismatch => f.write_str("identity mismatch"),
            RejectionReason::AssertionExpired => f.write_str("assertion expired"),
            RejectionReason::NotAuthorized => f.write_str("not authorized"),
            RejectionReason::Fault(detail) => write!(f, "error: {detail}"),
        }
    }
}

impl FromStr for RejectionReason {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "parse error" => RejectionReason::ParseError,
            "invalid access token" => RejectionReason::InvalidAccessToken,
            "identity mismatch" => RejectionReason::IdentityMismatch,
            "assertion expired" => RejectionReason::AssertionExpired,
            "not authorized" => RejectionReason::NotAuthorized,
            other => RejectionReason::Fault(
                other.strip_prefix("error: ").unwrap_or(other).to_string(),
            ),
        })
    }
}

/// The outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Release a signature share for this session.
    Accept,
    /// Refuse, for the given reason.
    Reject(RejectionReason),
}

impl PolicyDecision {
    /// Whether the decision is [`PolicyDecision::Accept`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyDecision::Accept)
    }
}

/// The engine's decision as nodes report it: `{"response":"true"}` or
/// `{"response":"false","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResponse {
    /// `"true"` or `"false"`.
    pub response: String,
    /// Present on refusal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&PolicyDecision> for PolicyResponse {
    fn from(decision: &PolicyDecision) -> Self {
        match decision {
            PolicyDecision::Accept => PolicyResponse {
                response: "true".into(),
                reason: None,
            },
            PolicyDecision::Reject(reason) => PolicyResponse {
                response: "false".into(),
                reason: Some(reason.to_string()),
            },
        }
    }
}

impl From<&PolicyResponse> for PolicyDecision {
    fn from(response: &PolicyResponse) -> Self {
        if response.response == "true" {
            return PolicyDecision::Accept;
        }
        let reason = response.reason.as_deref().unwrap_or("error: no reason given");
        match reason.parse() {
            Ok(reason) => PolicyDecision::Reject(reason),
            Err(never) => match never {},
        }
    }
}
