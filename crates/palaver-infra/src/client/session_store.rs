//! FileSessionStore -- the terminal client's session, kept as JSON in
//! `{data_dir}/session.json`.
//!
//! Password sign-in goes through GoTrue; token sign-in verifies the pasted
//! token against the server's `/api/profile`. Every sign-in and sign-out is
//! published on the store's [`AuthEventBus`].

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;

use palaver_core::session::{AuthEventBus, SessionStore};
use palaver_core::view::ChatApi;
use palaver_types::error::ClientError;
use palaver_types::identity::{AuthEvent, AuthSession};

use super::http_api::HttpChatApi;
use crate::auth::gotrue::{GoTrueIdentityProvider, SignInError};

pub const SESSION_FILE: &str = "session.json";

pub struct FileSessionStore {
    path: PathBuf,
    api: HttpChatApi,
    gotrue: Option<GoTrueIdentityProvider>,
    bus: AuthEventBus,
}

impl FileSessionStore {
    pub fn new(data_dir: &Path, api: HttpChatApi) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
            api,
            gotrue: None,
            bus: AuthEventBus::default(),
        }
    }

    /// Enable email/password sign-in against a GoTrue server.
    pub fn with_gotrue(mut self, gotrue: GoTrueIdentityProvider) -> Self {
        self.gotrue = Some(gotrue);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn supports_password(&self) -> bool {
        self.gotrue.is_some()
    }

    async fn read(&self) -> Result<Option<AuthSession>, ClientError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Session(e.to_string())),
        };

        match serde_json::from_slice::<AuthSession>(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn write(&self, session: &AuthSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Session(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(session).map_err(|e| ClientError::Session(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Session(e.to_string()))?;

        // The file holds a bearer token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| ClientError::Session(e.to_string()))?;
        }
        Ok(())
    }

    /// Publish `SignedOut` if the session file has gone away, e.g. after
    /// `palaver logout` in another terminal. Returns whether it had.
    pub async fn detect_sign_out(&self) -> bool {
        match self.read().await {
            Ok(Some(_)) => false,
            Ok(None) => {
                tracing::info!("Session removed outside this process");
                self.bus.publish(AuthEvent::SignedOut);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Could not check session file");
                false
            }
        }
    }

    async fn adopt(&self, session: AuthSession) -> Result<AuthSession, ClientError> {
        self.write(&session).await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.bus.publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }
}

impl SessionStore for FileSessionStore {
    async fn get_session(&self) -> Result<Option<AuthSession>, ClientError> {
        self.read().await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let gotrue = self.gotrue.as_ref().ok_or_else(|| {
            ClientError::Rejected("Password sign-in needs the gotrue auth provider; use a token instead".to_string())
        })?;

        let session = gotrue
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(|e| match e {
                SignInError::Rejected(message) => ClientError::Rejected(message),
                SignInError::Unavailable(message) => ClientError::Transport(message),
            })?;
        self.adopt(session).await
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<AuthSession, ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::Rejected("Token is required".to_string()));
        }

        let user = self.api.profile(token).await?;
        self.adopt(AuthSession {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
            user,
        })
        .await
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let previous = self.read().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read session before sign-out");
            None
        });

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ClientError::Session(e.to_string())),
        }

        if let (Some(gotrue), Some(session)) = (&self.gotrue, &previous) {
            if let Err(e) = gotrue.sign_out(&session.access_token).await {
                tracing::warn!(error = %e, "Server-side sign-out failed; local session cleared");
            }
        }

        tracing::info!("Signed out");
        self.bus.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use chrono::{Duration, Utc};
    use palaver_types::identity::UserProfile;
    use secrecy::SecretString;
    use tempfile::TempDir;

    async fn profile(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer plv_good") => (
                StatusCode::OK,
                Json(serde_json::json!({"id": "user-1", "email": "lan@example.com"})),
            ),
            _ => (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "Unauthorized"}))),
        }
    }

    async fn token(Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
        if body["password"] == "hunter2" {
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "access_token": "jwt",
                    "expires_in": 3600,
                    "user": {"id": "uid", "email": body["email"]}
                })),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error_description": "Invalid login credentials"})),
            )
        }
    }

    async fn store(dir: &TempDir) -> FileSessionStore {
        let router = axum::Router::new()
            .route("/api/profile", get(profile))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }));
        let base = test_server::spawn(router).await;
        FileSessionStore::new(dir.path(), HttpChatApi::new(base).unwrap())
    }

    async fn store_with_gotrue(dir: &TempDir) -> FileSessionStore {
        let router = axum::Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }));
        let base = test_server::spawn(router).await;
        let gotrue = GoTrueIdentityProvider::new(base.clone(), SecretString::from("anon".to_string())).unwrap();
        FileSessionStore::new(dir.path(), HttpChatApi::new(base).unwrap()).with_gotrue(gotrue)
    }

    #[tokio::test]
    async fn test_no_file_means_no_session() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        assert!(store.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_sign_in_persists_and_publishes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let mut feed = store.subscribe();

        let session = store.sign_in_with_token("  plv_good\n").await.unwrap();
        assert_eq!(session.access_token, "plv_good");
        assert_eq!(session.user.email, "lan@example.com");
        assert!(store.path().exists());

        let event = feed.recv().await.unwrap();
        assert!(matches!(event, AuthEvent::SignedIn(ref user) if user.id == "user-1"));

        let reloaded = store.get_session().await.unwrap().unwrap();
        assert_eq!(reloaded.access_token, "plv_good");
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let err = store.sign_in_with_token("plv_bad").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!store.path().exists());

        assert!(matches!(
            store.sign_in_with_token("   ").await,
            Err(ClientError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_password_sign_in_requires_gotrue() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        assert!(!store.supports_password());
        assert!(matches!(
            store.sign_in_with_password("lan@example.com", "hunter2").await,
            Err(ClientError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_password_sign_in_via_gotrue() {
        let dir = TempDir::new().unwrap();
        let store = store_with_gotrue(&dir).await;

        let session = store
            .sign_in_with_password("lan@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(session.access_token, "jwt");
        assert!(session.expires_at.is_some());

        let err = store
            .sign_in_with_password("lan@example.com", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_out_removes_file_and_publishes() {
        let dir = TempDir::new().unwrap();
        let store = store_with_gotrue(&dir).await;
        store
            .sign_in_with_password("lan@example.com", "hunter2")
            .await
            .unwrap();
        let mut feed = store.subscribe();

        store.sign_out().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(feed.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(store.get_session().await.unwrap().is_none());

        // Signing out twice is harmless.
        store.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_detect_sign_out_from_another_process() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        store.sign_in_with_token("plv_good").await.unwrap();
        let mut feed = store.subscribe();

        assert!(!store.detect_sign_out().await);
        assert!(feed.try_recv().is_err());

        tokio::fs::remove_file(store.path()).await.unwrap();
        assert!(store.detect_sign_out().await);
        assert_eq!(feed.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        tokio::fs::write(store.path(), b"{not json").await.unwrap();
        assert!(store.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_still_returned() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let session = AuthSession {
            access_token: "old".into(),
            refresh_token: None,
            expires_at: Some(Utc::now() - Duration::minutes(5)),
            user: UserProfile {
                id: "user-1".into(),
                email: "lan@example.com".into(),
                display_name: None,
                avatar_url: None,
            },
        };
        store.write(&session).await.unwrap();

        let stored = store.get_session().await.unwrap().unwrap();
        assert!(stored.is_expired(Utc::now()));
    }
}
