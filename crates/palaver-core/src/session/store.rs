//! SessionStore trait definition.

use palaver_types::error::ClientError;
use palaver_types::identity::{AuthEvent, AuthSession};
use tokio::sync::broadcast;

/// Client-side session storage with a change feed.
///
/// Implementations live in palaver-infra (e.g., `FileSessionStore`). Every
/// successful sign-in publishes `AuthEvent::SignedIn` and every sign-out
/// publishes `AuthEvent::SignedOut` to subscribers.
pub trait SessionStore: Send + Sync {
    /// The stored session, if any. Expiry is left to the caller.
    fn get_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<AuthSession>, ClientError>> + Send;

    /// Sign in with email and password through the identity provider.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<AuthSession, ClientError>> + Send;

    /// Adopt an already-issued bearer token after verifying it.
    fn sign_in_with_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<AuthSession, ClientError>> + Send;

    /// Drop the stored session.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), ClientError>> + Send;

    /// Subscribe to the change feed.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
