//! IdentityProvider trait definition and bearer header parsing.

use palaver_types::error::AuthError;
use palaver_types::identity::UserProfile;

/// Trait for identity backends (GoTrue, local API keys).
///
/// Implementations live in palaver-infra.
pub trait IdentityProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gotrue", "local").
    fn name(&self) -> &str;

    /// Resolve the user a token belongs to.
    fn get_user(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthError>> + Send;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// An absent header is `MissingCredential`; anything that is not a
/// non-empty bearer token is `MalformedCredential`.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)?
        .trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}
