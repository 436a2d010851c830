//! ChatApi trait definition: the client's view of the REST surface.

use palaver_types::chat::{ChatReply, ChatRequest, Conversation, Feedback, MessageView};
use palaver_types::error::ClientError;
use palaver_types::identity::UserProfile;
use uuid::Uuid;

/// Remote chat operations, each carrying the caller's bearer token.
///
/// Implemented by `HttpChatApi` in palaver-infra.
pub trait ChatApi: Send + Sync {
    fn send(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatReply, ClientError>> + Send;

    /// Messages ascending by creation time, optionally for one conversation.
    fn history(
        &self,
        token: &str,
        conversation_id: Option<&Uuid>,
    ) -> impl std::future::Future<Output = Result<Vec<MessageView>, ClientError>> + Send;

    fn conversations(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, ClientError>> + Send;

    fn set_feedback(
        &self,
        token: &str,
        message_id: &Uuid,
        feedback: Option<Feedback>,
    ) -> impl std::future::Future<Output = Result<MessageView, ClientError>> + Send;

    fn edit_message(
        &self,
        token: &str,
        message_id: &Uuid,
        content: &str,
    ) -> impl std::future::Future<Output = Result<MessageView, ClientError>> + Send;

    fn delete_conversation(
        &self,
        token: &str,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), ClientError>> + Send;

    fn profile(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserProfile, ClientError>> + Send;
}
