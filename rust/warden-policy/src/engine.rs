//! The policy verification state machine.
//!
//! One pass, no retries, each stage terminal on failure:
//!
//! ```text
//! Parse -> Freshness -> Remote-verify -> Match -> Permission -> Accept
//! ```
//!
//! Freshness runs before the provider is contacted, so a stale assertion is
//! refused as expired whatever the state of its token.

use crate::{PolicyDecision, PolicyDescriptor, PolicyKind, PolicyParams, RejectionReason};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_common::Clock;
use warden_identity::{
    ExternalIdentityDescriptor, IdentityAssertion, IdentityError, IdentityProvider,
};
use warden_ledger::{AuthMethodType, Ledger, LedgerError, TokenId};

/// Answers whether an auth method is bound to a key pair.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Whether `method_type`/`method_id` is permitted for `token`.
    async fn is_permitted(
        &self,
        token: &TokenId,
        method_type: &AuthMethodType,
        method_id: &[u8],
    ) -> Result<bool, LedgerError>;
}

#[async_trait]
impl<L> PermissionOracle for L
where
    L: Ledger,
{
    async fn is_permitted(
        &self,
        token: &TokenId,
        method_type: &AuthMethodType,
        method_id: &[u8],
    ) -> Result<bool, LedgerError> {
        self.is_permitted_auth_method(token, method_type, method_id)
            .await
    }
}

/// Runs one [`PolicyDescriptor`] against caller parameters.
///
/// The engine is deterministic given its collaborators' answers: every node
/// running it over the same parameters at the same time reaches the same
/// decision.
pub struct PolicyEngine<P, O> {
    descriptor: PolicyDescriptor,
    provider: P,
    oracle: O,
    clock: Arc<dyn Clock>,
}

impl<P, O> PolicyEngine<P, O>
where
    P: IdentityProvider,
    O: PermissionOracle,
{
    /// An engine for `descriptor`.
    pub fn new(descriptor: PolicyDescriptor, provider: P, oracle: O, clock: Arc<dyn Clock>) -> Self {
        Self {
            descriptor,
            provider,
            oracle,
            clock,
        }
    }

    /// The policy this engine runs.
    pub fn descriptor(&self) -> &PolicyDescriptor {
        &self.descriptor
    }

    /// Decide whether `params` authorize a session.
    pub async fn evaluate(&self, params: &PolicyParams) -> PolicyDecision {
        let decision = match self.descriptor.kind {
            PolicyKind::GitHubIdentity => self.evaluate_identity(params).await,
        };

        match &decision {
            PolicyDecision::Accept => debug!(token = %params.pkp_token_id, "Policy accepted"),
            PolicyDecision::Reject(reason) => {
                warn!(token = %params.pkp_token_id, %reason, "Policy rejected")
            }
        }

        decision
    }

    async fn evaluate_identity(&self, params: &PolicyParams) -> PolicyDecision {
        let Ok(assertion) = IdentityAssertion::from_json(&params.identity_assertion) else {
            return PolicyDecision::Reject(RejectionReason::ParseError);
        };
        if assertion.provider != self.provider.kind() {
            return PolicyDecision::Reject(RejectionReason::IdentityMismatch);
        }
        debug!(subject_id = assertion.subject_id, "Parsed identity assertion");

        let now = self.clock.now();
        if !assertion.is_fresh_at(now, self.descriptor.max_assertion_age()) {
            return PolicyDecision::Reject(RejectionReason::AssertionExpired);
        }
        debug!(age = ?assertion.age_at(now), "Assertion is fresh");

        let profile = match self.provider.whoami(&assertion.bearer_token).await {
            Ok(profile) => profile,
            Err(IdentityError::InvalidAccessToken { .. }) => {
                return PolicyDecision::Reject(RejectionReason::InvalidAccessToken);
            }
            Err(error) => return PolicyDecision::Reject(RejectionReason::Fault(error.to_string())),
        };
        debug!(subject_id = profile.id, "Provider verified token");

        if profile.id != assertion.subject_id {
            return PolicyDecision::Reject(RejectionReason::IdentityMismatch);
        }

        // The method id comes from the provider's answer, never the caller's.
        let verified = ExternalIdentityDescriptor {
            provider: assertion.provider,
            subject_id: profile.id,
        };
        let method_type = AuthMethodType::ExternalIdentity {
            namespace: self.descriptor.identity_method_type(),
        };

        match self
            .oracle
            .is_permitted(
                &params.pkp_token_id,
                &method_type,
                verified.method_id().as_slice(),
            )
            .await
        {
            Ok(true) => PolicyDecision::Accept,
            Ok(false) => PolicyDecision::Reject(RejectionReason::NotAuthorized),
            Err(error) => PolicyDecision::Reject(RejectionReason::Fault(error.to_string())),
        }
    }
}
