/// Authenticated request context
///
/// The API's JWT middleware validates the bearer token and inserts an
/// [`AuthContext`] into the request extensions; handlers read the caller
/// identity from there and trust it verbatim.

use uuid::Uuid;

/// Error type for credential extraction at the HTTP boundary
///
/// Covers the header itself; once a token is extracted, validation
/// failures are [`jwt::JwtError`](crate::auth::jwt::JwtError)s.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header present
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),
}

/// Identity of the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Verified user id from the token's `sub` claim
    pub user_id: Uuid,
}

impl AuthContext {
    /// Builds a context from a validated JWT subject
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
