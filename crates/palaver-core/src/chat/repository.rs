//! ChatRepository trait definition.
//!
//! Row insert/update/select for the two record kinds (messages and
//! conversations), filtered by owner and ordered by creation time.

use chrono::{DateTime, Utc};
use palaver_types::chat::{ChatMessage, Conversation, Feedback};
use palaver_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in palaver-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a conversation by its unique ID.
    fn get_conversation(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Bump a conversation's `updated_at`.
    fn touch_conversation(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's conversations, most recently updated first.
    fn list_conversations(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Delete a user's conversation and its messages.
    fn delete_conversation(
        &self,
        user_id: &str,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a new message row.
    fn insert_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_message(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// List a user's messages ordered by `created_at` ASC.
    ///
    /// When `conversation_id` is given, only that conversation's messages.
    fn list_messages(
        &self,
        user_id: &str,
        conversation_id: Option<&Uuid>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Replace a message's content.
    fn update_message_content(
        &self,
        id: &Uuid,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set or clear a message's feedback.
    fn set_feedback(
        &self,
        id: &Uuid,
        feedback: Option<Feedback>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
