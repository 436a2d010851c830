//! Profile view model: who is signed in, and the sign-out action.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use palaver_types::error::ClientError;
use palaver_types::identity::{AuthEvent, UserProfile};

use crate::session::{GateState, SessionGate, SessionStore};

use super::api::ChatApi;

pub struct ProfileView<S: SessionStore, A: ChatApi> {
    store: Arc<S>,
    api: Arc<A>,
    gate: SessionGate,
    profile: Option<UserProfile>,
}

impl<S: SessionStore, A: ChatApi> ProfileView<S, A> {
    pub fn new(store: Arc<S>, api: Arc<A>) -> Self {
        Self {
            store,
            api,
            gate: SessionGate::new(),
            profile: None,
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Check the session and fetch the server's view of the user.
    ///
    /// Falls back to the user recorded in the session when the server cannot
    /// be reached; a 401 redirects to login.
    pub async fn mount(&mut self) -> &GateState {
        self.gate.check(self.store.as_ref()).await;
        let Some(stored) = self.gate.user().cloned() else {
            return self.gate.state();
        };

        let fetched = match self.store.get_session().await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => {
                self.api.profile(&session.access_token).await
            }
            Ok(_) => Err(ClientError::NotAuthenticated),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(profile) => self.profile = Some(profile),
            Err(e) if e.is_unauthorized() => {
                self.gate.expire();
                self.profile = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile; showing stored user");
                self.profile = Some(stored);
            }
        }
        self.gate.state()
    }

    pub fn handle_auth_event(&mut self, event: &AuthEvent) -> &GateState {
        self.gate.observe(event);
        match self.gate.state() {
            GateState::Authenticated(user) => self.profile = Some(user.clone()),
            _ => self.profile = None,
        }
        self.gate.state()
    }

    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.store.sign_out().await?;
        self.gate.expire();
        self.profile = None;
        Ok(())
    }
}
