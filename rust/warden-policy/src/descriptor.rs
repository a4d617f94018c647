use crate::PolicyError;
use base58::{FromBase58, ToBase58};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use warden_common::{Duration, Keccak256Hash};
use warden_identity::{AUTH_METHOD_NAMESPACE, MAX_ASSERTION_AGE, auth_method_type};

/// Multihash code for sha2-256.
const SHA2_256_CODE: u8 = 0x12;

/// Length of a sha2-256 multihash: code, length, digest.
pub const POLICY_ID_SIZE: usize = 34;

/// The families of policy the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Re-verify a GitHub identity assertion and check it is bound to the
    /// target key pair.
    #[serde(rename = "githubIdentity")]
    GitHubIdentity,
}

/// Tunables of a [`PolicyKind::GitHubIdentity`] policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyParameters {
    /// Assertions this old or older are rejected.
    pub max_assertion_age_secs: u64,
    /// Namespace whose hash is the external identity auth method type.
    pub auth_method_namespace: String,
}

/// A versioned, statically known policy.
///
/// Descriptors are addressed by the sha2-256 multihash of their canonical
/// JSON encoding, so changing any parameter yields a different [`PolicyId`]
/// and therefore a policy no existing key pair is bound to.
///
/// ```rust
/// use warden_policy::PolicyDescriptor;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let policy = PolicyDescriptor::github_identity();
/// let shipped = policy.to_base64()?;
/// assert_eq!(PolicyDescriptor::from_base64(&shipped)?.id()?, policy.id()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyDescriptor {
    /// Engine version the descriptor targets.
    pub version: u32,
    /// Which policy to run.
    pub kind: PolicyKind,
    /// How to run it.
    pub parameters: PolicyParameters,
}

impl PolicyDescriptor {
    /// The only engine version this build runs.
    pub const CURRENT_VERSION: u32 = 1;

    /// The GitHub identity policy with default parameters.
    pub fn github_identity() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            kind: PolicyKind::GitHubIdentity,
            parameters: PolicyParameters {
                max_assertion_age_secs: MAX_ASSERTION_AGE.as_secs(),
                auth_method_namespace: AUTH_METHOD_NAMESPACE.to_string(),
            },
        }
    }

    /// Use a different auth method namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.parameters.auth_method_namespace = namespace.into();
        self
    }

    /// The canonical encoding the id is computed over.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, PolicyError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// This descriptor's content address.
    pub fn id(&self) -> Result<PolicyId, PolicyError> {
        Ok(PolicyId::of(&self.canonical_bytes()?))
    }

    /// Transport encoding for session requests.
    pub fn to_base64(&self) -> Result<String, PolicyError> {
        Ok(STANDARD.encode(self.canonical_bytes()?))
    }

    /// Decode the transport encoding, refusing versions this build cannot
    /// run.
    pub fn from_base64(encoded: &str) -> Result<Self, PolicyError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        let descriptor: PolicyDescriptor = serde_json::from_slice(&bytes)?;
        if descriptor.version != Self::CURRENT_VERSION {
            return Err(PolicyError::UnsupportedVersion(descriptor.version));
        }
        Ok(descriptor)
    }

    /// Oldest an assertion may be.
    pub fn max_assertion_age(&self) -> Duration {
        Duration::from_secs(self.parameters.max_assertion_age_secs)
    }

    /// The external identity auth method type this policy checks.
    pub fn identity_method_type(&self) -> Keccak256Hash {
        auth_method_type(&self.parameters.auth_method_namespace)
    }
}

/// Content address of a [`PolicyDescriptor`]: a sha2-256 multihash,
/// displayed in base58btc.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyId([u8; POLICY_ID_SIZE]);

impl PolicyId {
    /// Address `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut id = [0u8; POLICY_ID_SIZE];
        id[0] = SHA2_256_CODE;
        id[1] = 32;
        id[2..].copy_from_slice(digest.as_slice());
        Self(id)
    }

    /// The multihash bytes, used as the PolicyScript auth method id.
    pub fn as_bytes(&self) -> &[u8; POLICY_ID_SIZE] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PolicyId {
    type Error = PolicyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let id: [u8; POLICY_ID_SIZE] = bytes.try_into().map_err(|_| {
            PolicyError::InvalidId(format!(
                "expected {POLICY_ID_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        if id[0] != SHA2_256_CODE || id[1] != 32 {
            return Err(PolicyError::InvalidId("not a sha2-256 multihash".into()));
        }
        Ok(Self(id))
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_base58())
    }
}

impl fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({self})")
    }
}

impl FromStr for PolicyId {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s
            .from_base58()
            .map_err(|error| PolicyError::InvalidId(format!("{error:?}")))?;
        PolicyId::try_from(bytes.as_slice())
    }
}
