use thiserror::Error;

/// Failures decoding or addressing a policy descriptor.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The descriptor is not valid JSON of the expected shape.
    #[error("malformed policy descriptor: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The transport encoding is not valid base64.
    #[error("policy descriptor is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The descriptor targets an engine version this build does not run.
    #[error("unsupported policy version {0}")]
    UnsupportedVersion(u32),

    /// A policy id is not a sha2-256 multihash.
    #[error("invalid policy id: {0}")]
    InvalidId(String),
}
