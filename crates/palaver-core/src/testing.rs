//! In-memory fakes for the port traits, shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use palaver_types::chat::{
    ChatMessage, ChatReply, ChatRequest, Conversation, Feedback, MessageRole, MessageView,
};
use palaver_types::error::{AuthError, ClientError, RepositoryError};
use palaver_types::identity::{AuthEvent, AuthSession, UserProfile};
use palaver_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use crate::auth::IdentityProvider;
use crate::chat::repository::ChatRepository;
use crate::llm::provider::LlmProvider;
use crate::session::{AuthEventBus, SessionStore};
use crate::view::ChatApi;

pub const TOKEN: &str = "tok";
pub const TOKEN_OTHER: &str = "tok-other";

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: None,
        avatar_url: None,
    }
}

pub fn session(token: &str, expires_at: Option<DateTime<Utc>>) -> AuthSession {
    AuthSession {
        access_token: token.to_string(),
        refresh_token: None,
        expires_at,
        user: profile("user-1"),
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryChatRepository {
    messages: Mutex<Vec<ChatMessage>>,
    conversations: Mutex<Vec<Conversation>>,
}

impl MemoryChatRepository {
    pub fn all_messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn conversation(&self, id: &Uuid) -> Option<Conversation> {
        self.conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }
}

impl ChatRepository for MemoryChatRepository {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.conversations.lock().unwrap().push(conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversation(id))
    }

    async fn touch_conversation(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.updated_at = at;
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, RepositoryError> {
        let mut list: Vec<_> = self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn delete_conversation(&self, user_id: &str, id: &Uuid) -> Result<(), RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .retain(|c| !(c.user_id == user_id && &c.id == id));
        self.messages
            .lock()
            .unwrap()
            .retain(|m| m.conversation_id.as_ref() != Some(id));
        Ok(())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| &m.id == id)
            .cloned())
    }

    async fn list_messages(
        &self,
        user_id: &str,
        conversation_id: Option<&Uuid>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut list: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| conversation_id.is_none() || m.conversation_id.as_ref() == conversation_id)
            .cloned()
            .collect();
        list.sort_by_key(|m| m.created_at);
        Ok(list)
    }

    async fn update_message_content(&self, id: &Uuid, content: &str) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or(RepositoryError::NotFound)?;
        message.content = content.to_string();
        Ok(())
    }

    async fn set_feedback(&self, id: &Uuid, feedback: Option<Feedback>) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or(RepositoryError::NotFound)?;
        message.feedback = feedback;
        Ok(())
    }
}

/// Wraps `MemoryChatRepository`, failing the n-th `insert_message` call
/// (0-based).
pub struct FailingRepo {
    pub inner: MemoryChatRepository,
    fail_on_insert: usize,
    inserts: AtomicUsize,
}

impl FailingRepo {
    pub fn failing_on_insert(n: usize) -> Self {
        Self {
            inner: MemoryChatRepository::default(),
            fail_on_insert: n,
            inserts: AtomicUsize::new(0),
        }
    }
}

impl ChatRepository for FailingRepo {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.inner.create_conversation(conversation).await
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        self.inner.get_conversation(id).await
    }

    async fn touch_conversation(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.inner.touch_conversation(id, at).await
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, RepositoryError> {
        self.inner.list_conversations(user_id).await
    }

    async fn delete_conversation(&self, user_id: &str, id: &Uuid) -> Result<(), RepositoryError> {
        self.inner.delete_conversation(user_id, id).await
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) == self.fail_on_insert {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        self.inner.insert_message(message).await
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        self.inner.get_message(id).await
    }

    async fn list_messages(
        &self,
        user_id: &str,
        conversation_id: Option<&Uuid>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.inner.list_messages(user_id, conversation_id).await
    }

    async fn update_message_content(&self, id: &Uuid, content: &str) -> Result<(), RepositoryError> {
        self.inner.update_message_content(id, content).await
    }

    async fn set_feedback(&self, id: &Uuid, feedback: Option<Feedback>) -> Result<(), RepositoryError> {
        self.inner.set_feedback(id, feedback).await
    }
}

// ---------------------------------------------------------------------------
// Identity and inference
// ---------------------------------------------------------------------------

/// Accepts `TOKEN` as user-1 and `TOKEN_OTHER` as user-2.
#[derive(Default)]
pub struct FakeIdentity;

impl IdentityProvider for FakeIdentity {
    fn name(&self) -> &str {
        "fake"
    }

    async fn get_user(&self, token: &str) -> Result<UserProfile, AuthError> {
        match token {
            TOKEN => Ok(profile("user-1")),
            TOKEN_OTHER => Ok(profile("user-2")),
            _ => Err(AuthError::InvalidCredential),
        }
    }
}

pub struct FakeLlm {
    reply: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Arc::default(),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Some(prompt) = request.last_user_content() {
            self.prompts.lock().unwrap().push(prompt.to_string());
        }
        match &self.reply {
            Some(text) => Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: text.clone(),
                model: request.model.clone(),
                stop_reason: Some("stop".to_string()),
                usage: Usage::default(),
            }),
            None => Err(LlmError::Overloaded("model overloaded".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSessionStore {
    session: Mutex<Option<AuthSession>>,
    bus: AuthEventBus,
}

impl FakeSessionStore {
    pub fn signed_in(session: AuthSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            bus: AuthEventBus::default(),
        }
    }

    /// Drop the session without publishing an event.
    pub fn clear_silently(&self) {
        *self.session.lock().unwrap() = None;
    }

    fn adopt(&self, token: &str) -> AuthSession {
        let session = session(token, None);
        *self.session.lock().unwrap() = Some(session.clone());
        self.bus.publish(AuthEvent::SignedIn(session.user.clone()));
        session
    }
}

impl SessionStore for FakeSessionStore {
    async fn get_session(&self) -> Result<Option<AuthSession>, ClientError> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, _email: &str, password: &str) -> Result<AuthSession, ClientError> {
        if password.is_empty() {
            return Err(ClientError::Http {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(self.adopt(TOKEN))
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<AuthSession, ClientError> {
        Ok(self.adopt(token))
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        *self.session.lock().unwrap() = None;
        self.bus.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.bus.subscribe()
    }
}

#[derive(Default)]
struct FakeServer {
    messages: Vec<MessageView>,
    conversations: Vec<Conversation>,
    sent: Vec<String>,
    calls: usize,
}

/// A server double that keeps conversations in memory and accepts `TOKEN`.
#[derive(Default)]
pub struct FakeChatApi {
    reply: Option<String>,
    fail_status: Option<u16>,
    server: Mutex<FakeServer>,
}

impl FakeChatApi {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// `send` fails with the given status; everything else works.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.server.lock().unwrap().calls
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.server.lock().unwrap().sent.clone()
    }

    /// Store one finished exchange in a fresh conversation.
    pub fn seed_exchange(&self, user: &str, assistant: &str) {
        let mut server = self.server.lock().unwrap();
        let conversation = Conversation::started_by("user-1", user);
        for (role, content) in [(MessageRole::User, user), (MessageRole::Assistant, assistant)] {
            let message = ChatMessage::new("user-1", Some(conversation.id), role, content);
            server.messages.push(MessageView::new(message, None));
        }
        server.conversations.push(conversation);
    }

    fn enter(&self, token: &str) -> Result<std::sync::MutexGuard<'_, FakeServer>, ClientError> {
        let mut server = self.server.lock().unwrap();
        server.calls += 1;
        if token != TOKEN {
            return Err(unauthorized());
        }
        Ok(server)
    }
}

fn unauthorized() -> ClientError {
    ClientError::Http {
        status: 401,
        message: "Unauthorized".to_string(),
    }
}

fn not_found() -> ClientError {
    ClientError::Http {
        status: 400,
        message: "Message not found".to_string(),
    }
}

impl ChatApi for FakeChatApi {
    async fn send(&self, token: &str, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let mut server = self.enter(token)?;
        if let Some(status) = self.fail_status {
            return Err(ClientError::Http {
                status,
                message: "Internal server error".to_string(),
            });
        }
        server.sent.push(request.message.clone());

        let conversation_id = match &request.conversation_id {
            Some(id) => id.parse::<Uuid>().map_err(|_| ClientError::Http {
                status: 400,
                message: "Conversation not found".to_string(),
            })?,
            None => {
                let conversation = Conversation::started_by("user-1", &request.message);
                let id = conversation.id;
                server.conversations.push(conversation);
                id
            }
        };

        let reply = self.reply.clone().unwrap_or_else(|| "ok".to_string());
        for (role, content) in [
            (MessageRole::User, request.message.as_str()),
            (MessageRole::Assistant, reply.as_str()),
        ] {
            let message = ChatMessage::new("user-1", Some(conversation_id), role, content);
            server.messages.push(MessageView::new(message, None));
        }

        Ok(ChatReply {
            message: reply,
            success: true,
            conversation_id: conversation_id.to_string(),
        })
    }

    async fn history(
        &self,
        token: &str,
        conversation_id: Option<&Uuid>,
    ) -> Result<Vec<MessageView>, ClientError> {
        let server = self.enter(token)?;
        let mut list: Vec<_> = server
            .messages
            .iter()
            .filter(|m| conversation_id.is_none() || m.conversation_id.as_ref() == conversation_id)
            .cloned()
            .collect();
        list.sort_by_key(|m| m.created_at);
        Ok(list)
    }

    async fn conversations(&self, token: &str) -> Result<Vec<Conversation>, ClientError> {
        let server = self.enter(token)?;
        Ok(server.conversations.clone())
    }

    async fn set_feedback(
        &self,
        token: &str,
        message_id: &Uuid,
        feedback: Option<Feedback>,
    ) -> Result<MessageView, ClientError> {
        let mut server = self.enter(token)?;
        let message = server
            .messages
            .iter_mut()
            .find(|m| &m.id == message_id)
            .ok_or_else(not_found)?;
        message.feedback = feedback;
        Ok(message.clone())
    }

    async fn edit_message(
        &self,
        token: &str,
        message_id: &Uuid,
        content: &str,
    ) -> Result<MessageView, ClientError> {
        let mut server = self.enter(token)?;
        let message = server
            .messages
            .iter_mut()
            .find(|m| &m.id == message_id)
            .ok_or_else(not_found)?;
        message.content = content.to_string();
        Ok(message.clone())
    }

    async fn delete_conversation(&self, token: &str, conversation_id: &Uuid) -> Result<(), ClientError> {
        let mut server = self.enter(token)?;
        server.conversations.retain(|c| &c.id != conversation_id);
        server
            .messages
            .retain(|m| m.conversation_id.as_ref() != Some(conversation_id));
        Ok(())
    }

    async fn profile(&self, token: &str) -> Result<UserProfile, ClientError> {
        self.enter(token)?;
        Ok(profile("user-1"))
    }
}
