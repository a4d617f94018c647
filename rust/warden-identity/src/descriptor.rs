//! Ledger identifiers derived from external identities.

use crate::IdentityProviderKind;
use serde::{Deserialize, Serialize};
use warden_common::Keccak256Hash;

/// Namespace hashed into the auth method type of GitHub-bound key pairs.
pub const AUTH_METHOD_NAMESPACE: &str = "Warden GitHub Auth v1";

/// The auth method type registered on the ledger for a namespace.
///
/// ```rust
/// use warden_identity::{AUTH_METHOD_NAMESPACE, auth_method_type};
/// assert_ne!(auth_method_type(AUTH_METHOD_NAMESPACE), auth_method_type("Other v1"));
/// ```
pub fn auth_method_type(namespace: &str) -> Keccak256Hash {
    Keccak256Hash::hash(namespace.as_bytes())
}

/// The stable part of an identity: who, according to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentityDescriptor {
    /// Who vouches for the identity.
    pub provider: IdentityProviderKind,
    /// The provider's numeric user id.
    pub subject_id: u64,
}

impl ExternalIdentityDescriptor {
    /// A GitHub user.
    pub fn github(subject_id: u64) -> Self {
        Self {
            provider: IdentityProviderKind::GitHub,
            subject_id,
        }
    }

    /// `keccak256("<provider>:<subjectId>")`, the auth method id binding this
    /// identity to a key pair.
    pub fn method_id(&self) -> Keccak256Hash {
        Keccak256Hash::hash(format!("{}:{}", self.provider, self.subject_id).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_hashes_the_provider_prefixed_subject() {
        assert_eq!(
            ExternalIdentityDescriptor::github(12345).method_id(),
            Keccak256Hash::hash(b"github:12345")
        );
    }

    #[test]
    fn it_is_deterministic_and_distinct_per_subject() {
        let a = ExternalIdentityDescriptor::github(1).method_id();
        assert_eq!(a, ExternalIdentityDescriptor::github(1).method_id());
        assert_ne!(a, ExternalIdentityDescriptor::github(2).method_id());
    }

    #[test]
    fn it_hashes_the_namespace_for_the_method_type() {
        assert_eq!(
            auth_method_type(AUTH_METHOD_NAMESPACE),
            Keccak256Hash::hash(b"Warden GitHub Auth v1")
        );
    }
}
