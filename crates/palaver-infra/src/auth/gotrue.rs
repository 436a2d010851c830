//! GoTrueIdentityProvider -- identity backed by a GoTrue (Supabase Auth) server.
//!
//! Server side it only verifies bearer tokens (`GET /auth/v1/user`). The
//! client uses the same type to sign in with email and password and to
//! revoke the session on sign-out.
//!
//! The anon key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building request headers.

use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use palaver_core::auth::IdentityProvider;
use palaver_types::error::AuthError;
use palaver_types::identity::{AuthSession, UserProfile};

pub struct GoTrueIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: GoTrueUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueUserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl GoTrueUser {
    fn into_profile(self) -> UserProfile {
        let metadata = self.user_metadata;
        UserProfile {
            id: self.id,
            email: self.email.unwrap_or_default(),
            display_name: metadata.full_name.or(metadata.name),
            avatar_url: metadata.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.error)
    }
}

/// Why a password sign-in failed.
#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("{0}")]
    Rejected(String),

    #[error("auth server unavailable: {0}")]
    Unavailable(String),
}

impl GoTrueIdentityProvider {
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /auth/v1/token?grant_type=password`
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SignInError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token?grant_type=password"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| SignInError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: GoTrueErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .message()
                .unwrap_or_else(|| format!("sign-in failed with HTTP {status}"));
            return Err(if status.is_server_error() {
                SignInError::Unavailable(message)
            } else {
                SignInError::Rejected(message)
            });
        }

        let token: GoTrueTokenResponse = response
            .json()
            .await
            .map_err(|e| SignInError::Unavailable(format!("invalid token response: {e}")))?;

        Ok(AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            user: token.user.into_profile(),
        })
    }

    /// `POST /auth/v1/logout`. Revokes the refresh token server side.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("/auth/v1/logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 | 401 | 403 => Ok(()),
            status => Err(AuthError::Unavailable(format!("logout failed with HTTP {status}"))),
        }
    }
}

impl IdentityProvider for GoTrueIdentityProvider {
    fn name(&self) -> &str {
        "gotrue"
    }

    async fn get_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            // GoTrue answers an expired or forged JWT with 401/403, and some
            // versions with 400 "bad_jwt".
            400 | 401 | 403 => return Err(AuthError::InvalidCredential),
            _ => {
                return Err(AuthError::Unavailable(format!(
                    "identity provider returned HTTP {status}"
                )));
            }
        }

        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("invalid user response: {e}")))?;
        Ok(user.into_profile())
    }
}
