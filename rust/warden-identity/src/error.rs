use thiserror::Error;

/// Errors from acquiring or decoding an external identity.
///
/// All of these are recoverable only by authenticating again.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The authorization code was empty.
    #[error("authorization code is required")]
    MissingCode,

    /// The relay answered with an OAuth error.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The relay answered without an access token or an error.
    #[error("no access token received")]
    MissingAccessToken,

    /// The identity provider refused the bearer token.
    #[error("invalid access token (HTTP {status})")]
    InvalidAccessToken {
        /// HTTP status returned by the provider
        status: u16,
    },

    /// The request never produced a response.
    #[error("identity request failed: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A serialized assertion could not be decoded.
    #[error("malformed identity assertion: {0}")]
    Malformed(String),
}
