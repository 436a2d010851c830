//! Identity provider implementations.
//!
//! [`create_identity_provider`] picks one from `[auth]` in `config.toml`.

pub mod gotrue;
pub mod local;

use secrecy::SecretString;

use palaver_core::auth::BoxIdentityProvider;
use palaver_types::config::{AuthConfig, AuthProviderKind};
use palaver_types::error::AuthError;

use self::gotrue::GoTrueIdentityProvider;
use self::local::LocalIdentityProvider;
use crate::config::non_empty;
use crate::sqlite::api_keys::SqliteApiKeyStore;

/// Build the configured identity provider.
///
/// GoTrue needs `auth.url` and the anon key; local auth needs the key store.
pub fn create_identity_provider(
    config: &AuthConfig,
    anon_key: Option<SecretString>,
    keys: SqliteApiKeyStore,
) -> Result<BoxIdentityProvider, AuthError> {
    match config.provider {
        AuthProviderKind::Local => Ok(BoxIdentityProvider::new(LocalIdentityProvider::new(keys))),
        AuthProviderKind::Gotrue => Ok(BoxIdentityProvider::new(gotrue_provider(config, anon_key)?)),
    }
}

/// Build a GoTrue client from config, for server verification or client sign-in.
pub fn gotrue_provider(
    config: &AuthConfig,
    anon_key: Option<SecretString>,
) -> Result<GoTrueIdentityProvider, AuthError> {
    let url = non_empty(config.url.as_deref())
        .ok_or_else(|| AuthError::Unavailable("auth.url is not set".to_string()))?;
    let anon_key = anon_key.ok_or_else(|| {
        AuthError::Unavailable(format!("{} is not set", config.anon_key_env))
    })?;
    GoTrueIdentityProvider::new(url, anon_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;

    #[tokio::test]
    async fn test_factory_selects_provider() {
        let keys = SqliteApiKeyStore::new(test_pool().await);

        let local = create_identity_provider(&AuthConfig::default(), None, keys.clone()).unwrap();
        assert_eq!(local.name(), "local");

        let config = AuthConfig {
            provider: AuthProviderKind::Gotrue,
            url: Some("https://demo.supabase.co".to_string()),
            ..AuthConfig::default()
        };
        let anon = Some(SecretString::from("anon".to_string()));
        let gotrue = create_identity_provider(&config, anon, keys.clone()).unwrap();
        assert_eq!(gotrue.name(), "gotrue");

        let missing_key = create_identity_provider(&config, None, keys);
        assert!(matches!(missing_key, Err(AuthError::Unavailable(_))));
    }

    #[test]
    fn test_blank_gotrue_url_is_unset() {
        let config = AuthConfig {
            provider: AuthProviderKind::Gotrue,
            url: Some(String::new()),
            ..AuthConfig::default()
        };
        let anon = Some(SecretString::from("anon".to_string()));
        match gotrue_provider(&config, anon) {
            Err(AuthError::Unavailable(m)) => assert_eq!(m, "auth.url is not set"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("blank auth.url must not build a client"),
        }
    }
}
