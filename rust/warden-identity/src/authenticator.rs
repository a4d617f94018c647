use crate::{IdentityAssertion, IdentityError, IdentityProvider, TokenExchangeClient};
use std::sync::Arc;
use tracing::info;
use warden_common::Clock;

/// Turns an OAuth authorization code into a fresh [`IdentityAssertion`].
pub struct Authenticator<P> {
    relay: TokenExchangeClient,
    provider: P,
    clock: Arc<dyn Clock>,
}

impl<P> Authenticator<P>
where
    P: IdentityProvider,
{
    /// Authenticate through `relay` and `provider`, stamping with `clock`.
    pub fn new(relay: TokenExchangeClient, provider: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            relay,
            provider,
            clock,
        }
    }

    /// Exchange `code`, resolve the resulting token, and assert the identity
    /// as of now.
    pub async fn authenticate(&self, code: &str) -> Result<IdentityAssertion, IdentityError> {
        let bearer_token = self.relay.exchange(code).await?;
        let profile = self.provider.whoami(&bearer_token).await?;

        info!(
            provider = %self.provider.kind(),
            subject_id = profile.id,
            login = %profile.login,
            "Authenticated external identity"
        );

        Ok(IdentityAssertion {
            provider: self.provider.kind(),
            subject_id: profile.id,
            display_name: Some(profile.display_name()),
            asserted_at: self.clock.now(),
            bearer_token,
        })
    }
}
