//! Identity records handed out by the identity provider.
//!
//! Palaver never creates or mutates these on the provider's side; they are
//! read-only input to the chat handler and the client views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Name shown in greetings: the display name, else the email.
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// A client-side session: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserProfile,
}

impl AuthSession {
    /// Whether the access token has passed its expiry. Tokens without an
    /// expiry never expire client-side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Change-feed events published by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "user", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn(UserProfile),
    SignedOut,
    TokenRefreshed,
    UserUpdated(UserProfile),
}
