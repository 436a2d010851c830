//! Per-view session gate.
//!
//! A view starts `Unknown`, moves to `Checking` while the store is read, and
//! settles on `Authenticated` or `RedirectingToLogin`. Change-feed events can
//! move it again at any time; `SignedOut` always wins.

use chrono::Utc;
use palaver_types::identity::{AuthEvent, UserProfile};
use tracing::{debug, warn};

use super::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unknown,
    Checking,
    Authenticated(UserProfile),
    RedirectingToLogin,
}

/// Where a view should navigate to instead of rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat,
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    state: GateState,
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Unknown,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            GateState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, GateState::Authenticated(_))
    }

    pub fn is_redirecting(&self) -> bool {
        matches!(self.state, GateState::RedirectingToLogin)
    }

    /// Mount-time check against the store. An expired or unreadable session
    /// counts as absent.
    pub async fn check<S: SessionStore>(&mut self, store: &S) -> &GateState {
        self.state = GateState::Checking;
        self.state = match store.get_session().await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => {
                GateState::Authenticated(session.user)
            }
            Ok(Some(_)) => {
                debug!("Stored session has expired");
                GateState::RedirectingToLogin
            }
            Ok(None) => GateState::RedirectingToLogin,
            Err(e) => {
                warn!(error = %e, "Failed to read session");
                GateState::RedirectingToLogin
            }
        };
        &self.state
    }

    /// Apply a change-feed event.
    pub fn observe(&mut self, event: &AuthEvent) -> &GateState {
        match event {
            AuthEvent::SignedOut => self.state = GateState::RedirectingToLogin,
            AuthEvent::SignedIn(user) => self.state = GateState::Authenticated(user.clone()),
            AuthEvent::UserUpdated(user) => {
                if self.is_authenticated() {
                    self.state = GateState::Authenticated(user.clone());
                }
            }
            AuthEvent::TokenRefreshed => {}
        }
        &self.state
    }

    /// Force the login redirect, e.g. after the server rejects the token.
    pub fn expire(&mut self) {
        self.state = GateState::RedirectingToLogin;
    }

    /// Navigation the gate demands for a view showing `view`.
    ///
    /// Protected views bounce to login without a session; the login view
    /// bounces to chat when one exists.
    pub fn redirect_for(&self, view: Route) -> Option<Route> {
        match (view, &self.state) {
            (Route::Login, GateState::Authenticated(_)) => Some(Route::Chat),
            (Route::Chat, GateState::RedirectingToLogin) => Some(Route::Login),
            _ => None,
        }
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}
