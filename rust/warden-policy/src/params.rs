use serde::{Deserialize, Serialize};
use std::fmt;
use warden_identity::{IdentityAssertion, IdentityError};
use warden_ledger::TokenId;

/// The caller-supplied inputs a policy runs over.
///
/// The assertion travels in its serialized form so that the engine, not the
/// caller's transport, is the first to parse it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyParams {
    /// JSON-encoded [`IdentityAssertion`].
    pub identity_assertion: String,
    /// The key pair the session is for.
    pub pkp_token_id: TokenId,
}

impl PolicyParams {
    /// Parameters asking to use `token` on the strength of `assertion`.
    pub fn new(assertion: &IdentityAssertion, token: TokenId) -> Result<Self, IdentityError> {
        Ok(Self {
            identity_assertion: assertion.to_json()?,
            pkp_token_id: token,
        })
    }
}

impl fmt::Debug for PolicyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The assertion carries a bearer token.
        f.debug_struct("PolicyParams")
            .field("identity_assertion", &"<redacted>")
            .field("pkp_token_id", &self.pkp_token_id)
            .finish()
    }
}
