use crate::{BearerToken, IdentityError, IdentityProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What an identity provider reports about the holder of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Stable numeric user id.
    pub id: u64,
    /// Account handle.
    pub login: String,
    /// Profile name, when the user set one.
    #[serde(default)]
    pub name: Option<String>,
}

impl ProviderProfile {
    /// The profile name, falling back to the login.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.login.clone())
    }
}

/// Answers "who holds this token" for one identity provider.
///
/// The policy engine calls this to re-verify assertions, so implementations
/// must not cache answers across tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> IdentityProviderKind;

    /// Resolve the profile behind `token`.
    ///
    /// Fails with [`IdentityError::InvalidAccessToken`] when the provider
    /// refuses the token.
    async fn whoami(&self, token: &BearerToken) -> Result<ProviderProfile, IdentityError>;
}

#[async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    fn kind(&self) -> IdentityProviderKind {
        (**self).kind()
    }

    async fn whoami(&self, token: &BearerToken) -> Result<ProviderProfile, IdentityError> {
        (**self).whoami(token).await
    }
}
