//! Chat view model.
//!
//! Holds what the chat screen shows: the message list of the active
//! conversation, the conversation list, the in-flight flag and a single
//! notice line. Rendering is left to the front end; this type only decides
//! what changes when.
//!
//! Submitting appends the user's message optimistically under a temporary
//! id, then replaces the whole list from the server once the reply arrives.
//! A failed submit leaves the optimistic entry in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use palaver_types::chat::{ChatRequest, Conversation, Feedback, MessageRole, MessageView};
use palaver_types::error::ClientError;
use palaver_types::identity::{AuthEvent, UserProfile};

use crate::markup::{self, MarkupMode};
use crate::session::{GateState, SessionGate, SessionStore};

use super::api::ChatApi;

/// Notice shown for any failed submit. The cause only goes to the log.
pub const SUBMIT_FAILED_NOTICE: &str = "Sorry, something went wrong. Please try again.";

/// Notice shown when the message list cannot be loaded.
pub const LOAD_FAILED_NOTICE: &str = "Could not load messages.";

const TEMP_ID_PREFIX: &str = "temp-";

/// A message as displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewMessage {
    /// Server id, or a `temp-` id for an optimistic entry.
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub feedback: Option<Feedback>,
    pub pending: bool,
}

impl ViewMessage {
    fn optimistic(content: String) -> Self {
        Self {
            id: format!("{TEMP_ID_PREFIX}{}", Uuid::now_v7()),
            role: MessageRole::User,
            content,
            created_at: Utc::now(),
            feedback: None,
            pending: true,
        }
    }

    /// The persisted id, if this entry has one.
    pub fn server_id(&self) -> Option<Uuid> {
        if self.pending {
            return None;
        }
        self.id.parse().ok()
    }
}

impl From<MessageView> for ViewMessage {
    fn from(m: MessageView) -> Self {
        Self {
            id: m.id.to_string(),
            role: m.role,
            content: m.content,
            created_at: m.created_at,
            feedback: m.feedback,
            pending: false,
        }
    }
}

/// Result of [`ChatView::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or a request was already in flight.
    Ignored,
    Sent,
    Failed,
}

pub struct ChatView<S: SessionStore, A: ChatApi> {
    store: Arc<S>,
    api: Arc<A>,
    gate: SessionGate,
    markup: MarkupMode,
    messages: Vec<ViewMessage>,
    conversations: Vec<Conversation>,
    active: Option<Uuid>,
    in_flight: bool,
    notice: Option<String>,
}

impl<S: SessionStore, A: ChatApi> ChatView<S, A> {
    pub fn new(store: Arc<S>, api: Arc<A>, markup: MarkupMode) -> Self {
        Self {
            store,
            api,
            gate: SessionGate::new(),
            markup,
            messages: Vec::new(),
            conversations: Vec::new(),
            active: None,
            in_flight: false,
            notice: None,
        }
    }

    /// Open on a specific conversation instead of the full history.
    pub fn with_conversation(mut self, id: Uuid) -> Self {
        self.active = Some(id);
        self
    }

    // --- Accessors ---

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.gate.user()
    }

    pub fn messages(&self) -> &[ViewMessage] {
        &self.messages
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_conversation(&self) -> Option<Uuid> {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // --- Lifecycle ---

    /// Check the session, then load conversations and history.
    pub async fn mount(&mut self) -> &GateState {
        if self.gate.check(self.store.as_ref()).await == &GateState::RedirectingToLogin {
            return self.gate.state();
        }
        if let Err(e) = self.refresh_conversations().await {
            warn!(error = %e, "Failed to load conversations");
        }
        if let Err(e) = self.load_history().await {
            warn!(error = %e, "Failed to load messages");
            self.notice = Some(LOAD_FAILED_NOTICE.to_string());
        }
        self.gate.state()
    }

    /// Apply a session change-feed event.
    pub fn handle_auth_event(&mut self, event: &AuthEvent) -> &GateState {
        debug!(event = ?event, "Chat view received auth event");
        self.gate.observe(event);
        if self.gate.is_redirecting() {
            self.clear();
        }
        self.gate.state()
    }

    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.store.sign_out().await?;
        self.gate.expire();
        self.clear();
        Ok(())
    }

    // --- Sending ---

    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() || self.in_flight {
            return SubmitOutcome::Ignored;
        }

        self.in_flight = true;
        self.notice = None;
        self.messages.push(ViewMessage::optimistic(text.to_string()));

        let outcome = match self.send(text).await {
            Ok(()) => SubmitOutcome::Sent,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                if e.is_unauthorized() {
                    self.gate.expire();
                }
                self.notice = Some(SUBMIT_FAILED_NOTICE.to_string());
                SubmitOutcome::Failed
            }
        };
        self.in_flight = false;
        outcome
    }

    async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        let token = self.token().await?;
        let request = ChatRequest {
            message: text.to_string(),
            conversation_id: self.active.map(|id| id.to_string()),
        };
        let reply = self.api.send(&token, &request).await?;

        match reply.conversation_id.parse::<Uuid>() {
            Ok(id) => self.active = Some(id),
            Err(_) => warn!(conversation_id = %reply.conversation_id, "Server returned an unparseable conversation id"),
        }
        info!(conversation_id = ?self.active, "Reply received");

        self.load_history().await?;
        if let Err(e) = self.refresh_conversations().await {
            warn!(error = %e, "Failed to refresh conversations");
        }
        Ok(())
    }

    // --- Message actions ---

    /// Raw content of a message, for the clipboard.
    pub fn copy_text(&self, id: &str) -> Option<&str> {
        self.find(id).map(|m| m.content.as_str())
    }

    /// The HTML rendering of an assistant message.
    pub fn render(&self, id: &str) -> Option<String> {
        self.find(id)
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| markup::render_html(&m.content, self.markup))
    }

    /// React to a message. Choosing the current reaction again clears it.
    pub async fn toggle_feedback(
        &mut self,
        id: &str,
        feedback: Feedback,
    ) -> Result<Option<Feedback>, ClientError> {
        let (server_id, current) = {
            let message = self.persisted(id)?;
            (message.0, message.1.feedback)
        };
        let next = if current == Some(feedback) {
            None
        } else {
            Some(feedback)
        };

        let token = self.token().await?;
        let updated = self.api.set_feedback(&token, &server_id, next).await?;
        if let Some(m) = self.find_mut(id) {
            m.feedback = updated.feedback;
        }
        Ok(updated.feedback)
    }

    /// Replace the text of one of the user's own messages.
    pub async fn edit_message(&mut self, id: &str, content: &str) -> Result<(), ClientError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Rejected("Message cannot be empty".to_string()));
        }
        let server_id = {
            let (server_id, message) = self.persisted(id)?;
            if message.role != MessageRole::User {
                return Err(ClientError::Rejected(
                    "Only your own messages can be edited".to_string(),
                ));
            }
            server_id
        };

        let token = self.token().await?;
        let updated = self.api.edit_message(&token, &server_id, content).await?;
        if let Some(m) = self.find_mut(id) {
            m.content = updated.content;
        }
        Ok(())
    }

    // --- Conversations ---

    pub async fn refresh_conversations(&mut self) -> Result<(), ClientError> {
        let token = self.token().await?;
        self.conversations = self.api.conversations(&token).await?;
        Ok(())
    }

    /// Show only the messages of `id`.
    pub async fn switch_conversation(&mut self, id: Uuid) -> Result<(), ClientError> {
        self.active = Some(id);
        self.notice = None;
        self.load_history().await
    }

    /// Start over with an empty list. The conversation itself is created by
    /// the next submit.
    pub fn new_conversation(&mut self) {
        self.active = None;
        self.messages.clear();
        self.notice = None;
    }

    pub async fn delete_conversation(&mut self, id: Uuid) -> Result<(), ClientError> {
        let token = self.token().await?;
        self.api.delete_conversation(&token, &id).await?;
        self.conversations.retain(|c| c.id != id);
        if self.active == Some(id) {
            self.new_conversation();
        }
        Ok(())
    }

    // --- Internals ---

    async fn load_history(&mut self) -> Result<(), ClientError> {
        let token = self.token().await?;
        let history = self.api.history(&token, self.active.as_ref()).await;
        let history = history.inspect_err(|e| {
            if e.is_unauthorized() {
                self.gate.expire();
            }
        })?;
        self.messages = history.into_iter().map(ViewMessage::from).collect();
        Ok(())
    }

    async fn token(&self) -> Result<String, ClientError> {
        match self.store.get_session().await? {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session.access_token),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    fn find(&self, id: &str) -> Option<&ViewMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut ViewMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    fn persisted(&self, id: &str) -> Result<(Uuid, &ViewMessage), ClientError> {
        let message = self
            .find(id)
            .ok_or_else(|| ClientError::Rejected(format!("No message with id {id}")))?;
        let server_id = message
            .server_id()
            .ok_or_else(|| ClientError::Rejected("Message has not been saved yet".to_string()))?;
        Ok((server_id, message))
    }

    fn clear(&mut self) {
        self.messages.clear();
        self.conversations.clear();
        self.active = None;
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChatApi, FakeSessionStore, session};

    fn view(api: FakeChatApi) -> (ChatView<FakeSessionStore, FakeChatApi>, Arc<FakeSessionStore>, Arc<FakeChatApi>) {
        let store = Arc::new(FakeSessionStore::signed_in(session("tok", None)));
        let api = Arc::new(api);
        let view = ChatView::new(store.clone(), api.clone(), MarkupMode::Escaped);
        (view, store, api)
    }

    #[tokio::test]
    async fn test_mount_without_session_redirects_and_loads_nothing() {
        let store = Arc::new(FakeSessionStore::default());
        let api = Arc::new(FakeChatApi::default());
        let mut view = ChatView::new(store, api.clone(), MarkupMode::Escaped);

        assert_eq!(view.mount().await, &GateState::RedirectingToLogin);
        assert_eq!(api.call_count(), 0);
        assert!(view.messages().is_empty());
    }

    #[tokio::test]
    async fn test_mount_loads_history() {
        let api = FakeChatApi::default();
        api.seed_exchange("hello", "hi");
        let (mut view, _, _) = view(api);

        assert!(matches!(view.mount().await, GateState::Authenticated(_)));
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.conversations().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_appends_then_replaces_with_server_history() {
        let (mut view, _, api) = view(FakeChatApi::replying("Hi there!"));
        view.mount().await;

        assert_eq!(view.submit("  Hello  ").await, SubmitOutcome::Sent);
        assert_eq!(api.sent_messages(), vec!["Hello".to_string()]);

        let messages = view.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| !m.pending));
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].content, "Hi there!");
        assert!(view.active_conversation().is_some());
        assert_eq!(view.conversations().len(), 1);
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_submit_ignores_blank_input() {
        let (mut view, _, api) = view(FakeChatApi::replying("x"));
        view.mount().await;
        let calls = api.call_count();

        assert_eq!(view.submit("   ").await, SubmitOutcome::Ignored);
        assert!(view.messages().is_empty());
        assert_eq!(api.call_count(), calls);
    }

    #[tokio::test]
    async fn test_submit_ignored_while_in_flight() {
        let (mut view, _, _) = view(FakeChatApi::replying("x"));
        view.in_flight = true;
        assert_eq!(view.submit("Hello").await, SubmitOutcome::Ignored);
        assert!(view.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_optimistic_entry() {
        let (mut view, _, _) = view(FakeChatApi::failing(500));
        view.mount().await;

        assert_eq!(view.submit("Hello").await, SubmitOutcome::Failed);
        assert_eq!(view.notice(), Some(SUBMIT_FAILED_NOTICE));
        assert_eq!(view.messages().len(), 1);
        assert!(view.messages()[0].pending);
        assert!(view.messages()[0].id.starts_with(TEMP_ID_PREFIX));
        assert!(!view.is_busy());
        assert!(view.gate().is_authenticated());
    }

    #[tokio::test]
    async fn test_submit_rejected_token_redirects() {
        let (mut view, _, _) = view(FakeChatApi::failing(401));
        view.mount().await;
        assert_eq!(view.submit("Hello").await, SubmitOutcome::Failed);
        assert!(view.gate().is_redirecting());
    }

    #[tokio::test]
    async fn test_submit_without_session_fails_with_notice() {
        let (mut view, store, api) = view(FakeChatApi::replying("x"));
        view.mount().await;
        store.clear_silently();

        assert_eq!(view.submit("Hello").await, SubmitOutcome::Failed);
        assert_eq!(view.notice(), Some(SUBMIT_FAILED_NOTICE));
        assert!(api.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_toggles() {
        let (mut view, _, _) = view(FakeChatApi::replying("Answer"));
        view.mount().await;
        view.submit("Question").await;
        let id = view.messages()[1].id.clone();

        assert_eq!(view.toggle_feedback(&id, Feedback::Up).await.unwrap(), Some(Feedback::Up));
        assert_eq!(view.messages()[1].feedback, Some(Feedback::Up));

        assert_eq!(view.toggle_feedback(&id, Feedback::Down).await.unwrap(), Some(Feedback::Down));
        assert_eq!(view.toggle_feedback(&id, Feedback::Down).await.unwrap(), None);
        assert_eq!(view.messages()[1].feedback, None);
    }

    #[tokio::test]
    async fn test_feedback_on_pending_message_rejected() {
        let (mut view, _, _) = view(FakeChatApi::failing(500));
        view.mount().await;
        view.submit("Hello").await;
        let id = view.messages()[0].id.clone();
        let err = view.toggle_feedback(&id, Feedback::Up).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_edit_user_message_only() {
        let (mut view, _, _) = view(FakeChatApi::replying("Answer"));
        view.mount().await;
        view.submit("Qestion").await;
        let user_id = view.messages()[0].id.clone();
        let assistant_id = view.messages()[1].id.clone();

        view.edit_message(&user_id, "Question").await.unwrap();
        assert_eq!(view.messages()[0].content, "Question");

        let err = view.edit_message(&assistant_id, "nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        let err = view.edit_message(&user_id, "  ").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_copy_and_render() {
        let (mut view, _, _) = view(FakeChatApi::replying("**bold** <b>"));
        view.mount().await;
        view.submit("Format please").await;
        let user_id = view.messages()[0].id.clone();
        let assistant_id = view.messages()[1].id.clone();

        assert_eq!(view.copy_text(&assistant_id), Some("**bold** <b>"));
        assert_eq!(
            view.render(&assistant_id).unwrap(),
            "<strong>bold</strong> &lt;b&gt;"
        );
        assert_eq!(view.render(&user_id), None);
        assert_eq!(view.copy_text("missing"), None);
    }

    #[tokio::test]
    async fn test_switch_conversation_shows_only_that_conversation() {
        let (mut view, _, _) = view(FakeChatApi::replying("ok"));
        view.mount().await;
        view.submit("in A").await;
        let a = view.active_conversation().unwrap();
        view.new_conversation();
        assert!(view.messages().is_empty());
        view.submit("in B").await;
        let b = view.active_conversation().unwrap();
        assert_ne!(a, b);

        view.switch_conversation(a).await.unwrap();
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.messages()[0].content, "in A");

        view.switch_conversation(b).await.unwrap();
        let contents: Vec<_> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["in B", "ok"]);
        assert!(view.messages().windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(view.conversations().len(), 2);
    }

    #[tokio::test]
    async fn test_sign_out_elsewhere_redirects_via_feed() {
        let (mut view, store, _) = view(FakeChatApi::replying("ok"));
        let mut feed = store.subscribe();
        view.mount().await;
        view.submit("Hello").await;

        // Another view signs out through the shared store.
        store.sign_out().await.unwrap();
        let event = feed.recv().await.unwrap();
        view.handle_auth_event(&event);

        assert!(view.gate().is_redirecting());
        assert!(view.messages().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out() {
        let (mut view, store, _) = view(FakeChatApi::replying("ok"));
        view.mount().await;
        view.sign_out().await.unwrap();
        assert!(view.gate().is_redirecting());
        assert!(store.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_active_conversation_resets_view() {
        let (mut view, _, _) = view(FakeChatApi::replying("ok"));
        view.mount().await;
        view.submit("bye").await;
        let id = view.active_conversation().unwrap();

        view.delete_conversation(id).await.unwrap();
        assert!(view.conversations().is_empty());
        assert!(view.messages().is_empty());
        assert_eq!(view.active_conversation(), None);
    }
}
