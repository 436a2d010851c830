//! Chat service: the server-side request handler.
//!
//! `send_message` is the one orchestration path: verify the caller, validate,
//! resolve the conversation, persist the user message, call the model,
//! persist the reply. Each await is sequential and nothing is retried; a
//! failure at any step is terminal for the request and leaves earlier writes
//! in place.
//!
//! The remaining methods back the history/feedback/edit surface. Each one
//! re-verifies the credential the same way.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use palaver_types::chat::{
    ChatMessage, ChatReply, ChatRequest, Conversation, Feedback, MessageRole,
};
use palaver_types::error::{ChatError, StorageStage};
use palaver_types::identity::UserProfile;
use palaver_types::llm::CompletionRequest;

use crate::auth::{BoxIdentityProvider, parse_bearer};
use crate::chat::repository::ChatRepository;
use crate::llm::box_provider::BoxLlmProvider;

/// Orchestrates authentication, persistence and inference for chat requests.
///
/// Generic over `ChatRepository` to keep palaver-core free of infra crates;
/// the identity and inference providers are boxed because they are picked
/// from configuration at runtime.
pub struct ChatService<R: ChatRepository> {
    repo: R,
    identity: BoxIdentityProvider,
    llm: BoxLlmProvider,
    max_tokens: u32,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R, identity: BoxIdentityProvider, llm: BoxLlmProvider, max_tokens: u32) -> Self {
        Self {
            repo,
            identity,
            llm,
            max_tokens,
        }
    }

    /// Access the chat repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Name of the identity provider in use.
    pub fn identity_provider(&self) -> &str {
        self.identity.name()
    }

    /// Name and model of the inference provider in use.
    pub fn inference_provider(&self) -> (&str, &str) {
        (self.llm.name(), self.llm.model())
    }

    /// Verify the `Authorization` header value against the identity provider.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<UserProfile, ChatError> {
        let token = parse_bearer(authorization).inspect_err(|e| {
            debug!(reason = %e, "Rejected authorization header");
        })?;
        let user = self.identity.get_user(token).await.inspect_err(|e| {
            warn!(provider = self.identity.name(), error = %e, "Credential verification failed");
        })?;
        Ok(user)
    }

    // --- The chat exchange ---

    /// Handle one `POST /api/chat` call.
    pub async fn send_message(
        &self,
        authorization: Option<&str>,
        request: ChatRequest,
    ) -> Result<ChatReply, ChatError> {
        let user = self.authenticate(authorization).await?;

        if request.message.trim().is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }

        let conversation = self
            .resolve_conversation(&user, request.conversation_id.as_deref(), &request.message)
            .await?;

        let user_message = ChatMessage::new(
            user.id.clone(),
            Some(conversation.id),
            MessageRole::User,
            request.message.clone(),
        );
        self.repo
            .insert_message(&user_message)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, conversation_id = %conversation.id, error = %e, "Error saving user message");
                ChatError::storage(StorageStage::UserMessage, e)
            })?;

        let completion_request =
            CompletionRequest::single_turn(self.llm.model(), request.message, self.max_tokens);
        let started = std::time::Instant::now();
        let completion = self.llm.complete(&completion_request).await.map_err(|e| {
            error!(
                provider = self.llm.name(),
                model = self.llm.model(),
                conversation_id = %conversation.id,
                error = %e,
                "Inference call failed"
            );
            ChatError::Inference(e)
        })?;
        info!(
            provider = self.llm.name(),
            model = %completion.model,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Inference call completed"
        );

        let assistant_message = ChatMessage::new(
            user.id.clone(),
            Some(conversation.id),
            MessageRole::Assistant,
            completion.content,
        );
        self.repo
            .insert_message(&assistant_message)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, conversation_id = %conversation.id, error = %e, "Error saving AI message");
                ChatError::storage(StorageStage::AssistantMessage, e)
            })?;

        if let Err(e) = self
            .repo
            .touch_conversation(&conversation.id, assistant_message.created_at)
            .await
        {
            warn!(conversation_id = %conversation.id, error = %e, "Failed to bump conversation updated_at");
        }

        Ok(ChatReply {
            message: assistant_message.content,
            success: true,
            conversation_id: conversation.id.to_string(),
        })
    }

    /// Load the caller's conversation, or start one seeded from the message.
    async fn resolve_conversation(
        &self,
        user: &UserProfile,
        conversation_id: Option<&str>,
        first_message: &str,
    ) -> Result<Conversation, ChatError> {
        match conversation_id.filter(|id| !id.trim().is_empty()) {
            Some(raw) => {
                let id = parse_id(raw, "conversationId")?;
                self.owned_conversation(user, &id).await
            }
            None => {
                let conversation = Conversation::started_by(user.id.clone(), first_message);
                self.repo
                    .create_conversation(&conversation)
                    .await
                    .map_err(|e| {
                        error!(user_id = %user.id, error = %e, "Error creating conversation");
                        ChatError::storage(StorageStage::Conversation, e)
                    })?;
                info!(user_id = %user.id, conversation_id = %conversation.id, "Conversation created");
                Ok(conversation)
            }
        }
    }

    async fn owned_conversation(
        &self,
        user: &UserProfile,
        id: &Uuid,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .repo
            .get_conversation(id)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Lookup, e))?;
        match conversation {
            Some(c) if c.user_id == user.id => Ok(c),
            _ => Err(ChatError::Validation("Conversation not found".to_string())),
        }
    }

    async fn owned_message(&self, user: &UserProfile, raw_id: &str) -> Result<ChatMessage, ChatError> {
        let id = parse_id(raw_id, "message id")?;
        let message = self
            .repo
            .get_message(&id)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Lookup, e))?;
        match message {
            Some(m) if m.user_id == user.id => Ok(m),
            _ => Err(ChatError::Validation("Message not found".to_string())),
        }
    }

    // --- History and conversations ---

    /// The caller's messages, oldest first, optionally for one conversation.
    pub async fn history(
        &self,
        authorization: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let user = self.authenticate(authorization).await?;
        let conversation_id = match conversation_id.filter(|id| !id.trim().is_empty()) {
            Some(raw) => Some(parse_id(raw, "conversationId")?),
            None => None,
        };
        self.repo
            .list_messages(&user.id, conversation_id.as_ref())
            .await
            .map_err(|e| ChatError::storage(StorageStage::Lookup, e))
    }

    /// The caller's conversations, most recently updated first.
    pub async fn conversations(
        &self,
        authorization: Option<&str>,
    ) -> Result<Vec<Conversation>, ChatError> {
        let user = self.authenticate(authorization).await?;
        self.repo
            .list_conversations(&user.id)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Lookup, e))
    }

    /// Delete one of the caller's conversations with its messages.
    pub async fn delete_conversation(
        &self,
        authorization: Option<&str>,
        conversation_id: &str,
    ) -> Result<(), ChatError> {
        let user = self.authenticate(authorization).await?;
        let id = parse_id(conversation_id, "conversationId")?;
        self.owned_conversation(&user, &id).await?;
        self.repo
            .delete_conversation(&user.id, &id)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Update, e))?;
        info!(user_id = %user.id, conversation_id = %id, "Conversation deleted");
        Ok(())
    }

    /// The caller's identity record.
    pub async fn profile(&self, authorization: Option<&str>) -> Result<UserProfile, ChatError> {
        self.authenticate(authorization).await
    }

    // --- Message mutations ---

    /// Set or clear the reaction on one of the caller's messages.
    pub async fn set_feedback(
        &self,
        authorization: Option<&str>,
        message_id: &str,
        feedback: Option<Feedback>,
    ) -> Result<ChatMessage, ChatError> {
        let user = self.authenticate(authorization).await?;
        let mut message = self.owned_message(&user, message_id).await?;
        self.repo
            .set_feedback(&message.id, feedback)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Update, e))?;
        message.feedback = feedback;
        debug!(message_id = %message.id, feedback = ?feedback, "Feedback updated");
        Ok(message)
    }

    /// Replace the content of one of the caller's own `user` messages.
    pub async fn edit_message(
        &self,
        authorization: Option<&str>,
        message_id: &str,
        content: String,
    ) -> Result<ChatMessage, ChatError> {
        let user = self.authenticate(authorization).await?;
        if content.trim().is_empty() {
            return Err(ChatError::Validation("Content is required".to_string()));
        }
        let mut message = self.owned_message(&user, message_id).await?;
        if message.role != MessageRole::User {
            return Err(ChatError::Validation(
                "Only user messages can be edited".to_string(),
            ));
        }
        self.repo
            .update_message_content(&message.id, &content)
            .await
            .map_err(|e| ChatError::storage(StorageStage::Update, e))?;
        message.content = content;
        info!(message_id = %message.id, edited_at = %Utc::now(), "Message edited");
        Ok(message)
    }
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ChatError> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|_| ChatError::Validation(format!("Invalid {what}: {raw}")))
}
