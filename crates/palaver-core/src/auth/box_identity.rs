//! BoxIdentityProvider -- object-safe dynamic dispatch wrapper for IdentityProvider.
//!
//! Same blanket-impl pattern as `BoxLlmProvider`:
//! 1. Define an object-safe `IdentityProviderDyn` trait with boxed futures
//! 2. Blanket-impl `IdentityProviderDyn` for all `T: IdentityProvider`
//! 3. `BoxIdentityProvider` wraps `Box<dyn IdentityProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use palaver_types::error::AuthError;
use palaver_types::identity::UserProfile;

use super::provider::IdentityProvider;

/// Object-safe version of [`IdentityProvider`] with boxed futures.
pub trait IdentityProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn get_user_boxed<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile, AuthError>> + Send + 'a>>;
}

impl<T: IdentityProvider> IdentityProviderDyn for T {
    fn name(&self) -> &str {
        IdentityProvider::name(self)
    }

    fn get_user_boxed<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserProfile, AuthError>> + Send + 'a>> {
        Box::pin(self.get_user(token))
    }
}

/// Type-erased identity provider for runtime selection (config-driven).
pub struct BoxIdentityProvider {
    inner: Box<dyn IdentityProviderDyn + Send + Sync>,
}

impl BoxIdentityProvider {
    /// Wrap a concrete `IdentityProvider` in a type-erased box.
    pub fn new<T: IdentityProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn get_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.inner.get_user_boxed(token).await
    }
}

impl std::fmt::Debug for BoxIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxIdentityProvider")
            .field("name", &self.name())
            .finish()
    }
}
