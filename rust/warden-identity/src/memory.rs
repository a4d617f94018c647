use crate::{BearerToken, IdentityError, IdentityProvider, IdentityProviderKind, ProviderProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An [`IdentityProvider`] answering from a fixed table of tokens.
///
/// Unknown or revoked tokens are refused with HTTP 401, the way GitHub
/// refuses them. Clones share the same table.
#[derive(Clone, Debug)]
pub struct StaticIdentityProvider {
    kind: IdentityProviderKind,
    profiles: Arc<RwLock<HashMap<String, ProviderProfile>>>,
}

impl Default for StaticIdentityProvider {
    fn default() -> Self {
        Self::new(IdentityProviderKind::GitHub)
    }
}

impl StaticIdentityProvider {
    /// An empty provider of the given kind.
    pub fn new(kind: IdentityProviderKind) -> Self {
        Self {
            kind,
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Make `token` resolve to `profile`.
    pub async fn insert(&self, token: &BearerToken, profile: ProviderProfile) {
        self.profiles
            .write()
            .await
            .insert(token.expose().to_string(), profile);
    }

    /// Stop honouring `token`.
    pub async fn revoke(&self, token: &BearerToken) {
        self.profiles.write().await.remove(token.expose());
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn kind(&self) -> IdentityProviderKind {
        self.kind
    }

    async fn whoami(&self, token: &BearerToken) -> Result<ProviderProfile, IdentityError> {
        self.profiles
            .read()
            .await
            .get(token.expose())
            .cloned()
            .ok_or(IdentityError::InvalidAccessToken { status: 401 })
    }
}
