//! Auth method bindings attached to a key pair at mint time.

use crate::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_common::{HexBytes, Keccak256Hash, hex_array};

/// Type code the ledger assigns to policy-script auth methods.
pub const POLICY_SCRIPT_METHOD_TYPE: u64 = 2;

/// How an auth method proves itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AuthMethodType {
    /// A content-addressed policy run by the signing network.
    PolicyScript,
    /// An external identity family, identified by its namespace hash.
    ExternalIdentity {
        /// `keccak256` of the namespace string.
        namespace: Keccak256Hash,
    },
}

impl AuthMethodType {
    /// The 32-byte type word the ledger stores.
    pub fn type_word(&self) -> [u8; 32] {
        match self {
            AuthMethodType::PolicyScript => {
                let mut word = [0u8; 32];
                word[24..].copy_from_slice(&POLICY_SCRIPT_METHOD_TYPE.to_be_bytes());
                word
            }
            AuthMethodType::ExternalIdentity { namespace } => *namespace.bytes(),
        }
    }
}

/// What a binding lets its method do directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthMethodScope {
    /// The method only gates policy evaluation.
    NoPermissions = 0,
    /// The method may authorize any signature.
    SignAnything = 1,
}

impl fmt::Display for AuthMethodScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethodScope::NoPermissions => f.write_str("no-permissions"),
            AuthMethodScope::SignAnything => f.write_str("sign-anything"),
        }
    }
}

/// One `(type, id, scope)` authorization path for a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMethodBinding {
    /// How the method proves itself.
    pub method_type: AuthMethodType,
    /// Which concrete method of that type.
    pub method_id: HexBytes,
    /// What it may do directly.
    pub scope: AuthMethodScope,
}

impl AuthMethodBinding {
    /// Bind a policy script with full signing scope.
    pub fn policy_script(method_id: impl Into<HexBytes>) -> Self {
        Self {
            method_type: AuthMethodType::PolicyScript,
            method_id: method_id.into(),
            scope: AuthMethodScope::SignAnything,
        }
    }

    /// Bind an external identity with no direct scope.
    pub fn external_identity(namespace: Keccak256Hash, method_id: Keccak256Hash) -> Self {
        Self {
            method_type: AuthMethodType::ExternalIdentity { namespace },
            method_id: HexBytes::from(method_id.as_slice()),
            scope: AuthMethodScope::NoPermissions,
        }
    }

}

/// A binding in the form the ledger records it, with the method type
/// flattened to its 32-byte type word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermittedAuthMethod {
    /// See [`AuthMethodType::type_word`].
    #[serde(with = "hex_array")]
    pub type_word: [u8; 32],
    /// Which concrete method of that type.
    pub method_id: HexBytes,
    /// What it may do directly.
    pub scope: AuthMethodScope,
}

impl PermittedAuthMethod {
    /// Whether this entry is for exactly `method_type` and `method_id`.
    pub fn matches(&self, method_type: &AuthMethodType, method_id: &[u8]) -> bool {
        self.type_word == method_type.type_word() && self.method_id.as_slice() == method_id
    }
}

impl From<&AuthMethodBinding> for PermittedAuthMethod {
    fn from(binding: &AuthMethodBinding) -> Self {
        Self {
            type_word: binding.method_type.type_word(),
            method_id: binding.method_id.clone(),
            scope: binding.scope,
        }
    }
}

/// The bindings a key pair is minted with.
///
/// A set is only constructible when it contains exactly one policy script
/// bound with [`AuthMethodScope::SignAnything`] and at least one external
/// identity bound with [`AuthMethodScope::NoPermissions`]. External
/// identities may never carry direct scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BindingSet(Vec<AuthMethodBinding>);

impl BindingSet {
    /// Validate `bindings`.
    pub fn new(bindings: Vec<AuthMethodBinding>) -> Result<Self, LedgerError> {
        let policies: Vec<_> = bindings
            .iter()
            .filter(|binding| binding.method_type == AuthMethodType::PolicyScript)
            .collect();

        match policies.as_slice() {
            [policy] if policy.scope == AuthMethodScope::SignAnything => {}
            [_] => {
                return Err(LedgerError::InvalidBindings(
                    "policy script must be bound with sign-anything scope".into(),
                ));
            }
            _ => {
                return Err(LedgerError::InvalidBindings(format!(
                    "expected exactly one policy script binding, found {}",
                    policies.len()
                )));
            }
        }

        let mut identities = 0;
        for binding in &bindings {
            if let AuthMethodType::ExternalIdentity { .. } = binding.method_type {
                if binding.scope != AuthMethodScope::NoPermissions {
                    return Err(LedgerError::InvalidBindings(format!(
                        "external identity bound with {} scope",
                        binding.scope
                    )));
                }
                identities += 1;
            }
        }

        if identities == 0 {
            return Err(LedgerError::InvalidBindings(
                "at least one external identity binding is required".into(),
            ));
        }

        Ok(Self(bindings))
    }

    /// The bindings in submission order.
    pub fn bindings(&self) -> &[AuthMethodBinding] {
        &self.0
    }

    /// The bindings as the ledger records them.
    pub fn permitted_auth_methods(&self) -> Vec<PermittedAuthMethod> {
        self.0.iter().map(PermittedAuthMethod::from).collect()
    }
}

impl<'de> Deserialize<'de> for BindingSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bindings = Vec::<AuthMethodBinding>::deserialize(deserializer)?;
        BindingSet::new(bindings).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    fn namespace() -> Keccak256Hash {
        Keccak256Hash::hash(b"Example Auth v1")
    }

    fn identity(subject: &str) -> AuthMethodBinding {
        AuthMethodBinding::external_identity(namespace(), Keccak256Hash::hash(subject.as_bytes()))
    }

    #[test]
    fn it_accepts_a_policy_with_an_identity() -> TestResult {
        let set = BindingSet::new(vec![
            AuthMethodBinding::policy_script(vec![0x12, 0x20, 1, 2]),
            identity("github:1"),
        ])?;
        let permitted = set.permitted_auth_methods();
        let permits = |method_type: &AuthMethodType, method_id: &[u8]| {
            permitted
                .iter()
                .any(|entry| entry.matches(method_type, method_id))
        };

        assert!(permits(&AuthMethodType::PolicyScript, &[0x12, 0x20, 1, 2]));
        assert!(permits(
            &AuthMethodType::ExternalIdentity {
                namespace: namespace()
            },
            Keccak256Hash::hash(b"github:1").as_slice()
        ));
        assert!(!permits(&AuthMethodType::PolicyScript, &[0x12]));
        Ok(())
    }

    #[test]
    fn it_requires_an_identity_binding() {
        let result = BindingSet::new(vec![AuthMethodBinding::policy_script(vec![1])]);
        assert!(matches!(result, Err(LedgerError::InvalidBindings(_))));
    }

    #[test]
    fn it_requires_exactly_one_policy() {
        assert!(BindingSet::new(vec![identity("github:1")]).is_err());
        assert!(
            BindingSet::new(vec![
                AuthMethodBinding::policy_script(vec![1]),
                AuthMethodBinding::policy_script(vec![2]),
                identity("github:1"),
            ])
            .is_err()
        );
    }

    #[test]
    fn it_refuses_scoped_identities_and_unscoped_policies() {
        let mut scoped = identity("github:1");
        scoped.scope = AuthMethodScope::SignAnything;
        assert!(
            BindingSet::new(vec![AuthMethodBinding::policy_script(vec![1]), scoped]).is_err()
        );

        let mut unscoped = AuthMethodBinding::policy_script(vec![1]);
        unscoped.scope = AuthMethodScope::NoPermissions;
        assert!(BindingSet::new(vec![unscoped, identity("github:1")]).is_err());
    }

    #[test]
    fn it_validates_when_deserialized() {
        let json = serde_json::json!([{
            "methodType": { "kind": "policyScript" },
            "methodId": "0x01",
            "scope": "SignAnything"
        }]);
        assert!(serde_json::from_value::<BindingSet>(json).is_err());
    }

    #[test]
    fn it_records_type_words_instead_of_method_kinds() -> TestResult {
        let set = BindingSet::new(vec![
            AuthMethodBinding::policy_script(vec![0x12, 0x20]),
            identity("github:1"),
        ])?;
        let permitted = set.permitted_auth_methods();

        let policy = &permitted[0].type_word;
        assert_eq!(policy[31], POLICY_SCRIPT_METHOD_TYPE as u8);
        assert!(policy[..31].iter().all(|byte| *byte == 0));
        assert_eq!(permitted[1].type_word, *namespace().bytes());

        let json = serde_json::to_value(&permitted[0])?;
        assert_eq!(
            json["typeWord"],
            format!("0x{}", "0".repeat(62) + "02")
        );
        Ok(())
    }
}
