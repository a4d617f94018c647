//! External identity for programmable key pairs.
//!
//! This crate covers everything on the identity side of the protocol:
//!
//! 1. [`TokenExchangeClient`] swaps an OAuth authorization code for a bearer
//!    token through a stateless relay
//! 2. an [`IdentityProvider`] (GitHub via [`GitHubClient`]) answers "who am I"
//!    for that token
//! 3. [`Authenticator`] stamps the result into an [`IdentityAssertion`]
//! 4. [`ExternalIdentityDescriptor`] derives the ledger auth method id that
//!    binds the identity to a key pair
//!
//! Assertions are short-lived by construction: the policy engine rejects any
//! assertion older than [`MAX_ASSERTION_AGE`], and nothing here persists
//! them.

mod assertion;
mod authenticator;
mod descriptor;
mod error;
mod github;
mod memory;
mod provider;
mod relay;

pub use assertion::{BearerToken, IdentityAssertion, IdentityProviderKind, MAX_ASSERTION_AGE};
pub use authenticator::Authenticator;
pub use descriptor::{AUTH_METHOD_NAMESPACE, ExternalIdentityDescriptor, auth_method_type};
pub use error::IdentityError;
pub use github::{GITHUB_API_URL, GitHubClient, GitHubConfig};
pub use memory::StaticIdentityProvider;
pub use provider::{IdentityProvider, ProviderProfile};
pub use relay::{RelayConfig, TokenExchangeClient};
