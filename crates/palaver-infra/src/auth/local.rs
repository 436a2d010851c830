//! LocalIdentityProvider -- bearer tokens are API keys issued by this server.

use palaver_core::auth::IdentityProvider;
use palaver_types::error::AuthError;
use palaver_types::identity::UserProfile;

use crate::sqlite::api_keys::SqliteApiKeyStore;

/// Verifies tokens against the `api_keys` table by SHA-256 hash.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    keys: SqliteApiKeyStore,
}

impl LocalIdentityProvider {
    pub fn new(keys: SqliteApiKeyStore) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &SqliteApiKeyStore {
        &self.keys
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn get_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        match self.keys.find_user_by_key(token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::InvalidCredential),
            Err(e) => {
                tracing::error!(error = %e, "API key lookup failed");
                Err(AuthError::Unavailable(e.to_string()))
            }
        }
    }
}
