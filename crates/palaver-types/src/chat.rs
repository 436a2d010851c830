//! Chat message and conversation types for Palaver.
//!
//! A conversation is a thread owned by one user; messages are the rows the
//! chat handler writes (one `user`, one `assistant` per exchange).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Number of characters of the first message used as a conversation title.
pub const TITLE_SEED_CHARS: usize = 30;

/// Author of a stored chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A per-message reaction left by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Up => write!(f, "up"),
            Feedback::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Feedback::Up),
            "down" => Ok(Feedback::Down),
            other => Err(format!("invalid feedback: '{other}'")),
        }
    }
}

/// A single stored chat message.
///
/// Only `content` (user edits) and `feedback` (reactions) change after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_id: Option<Uuid>,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
    pub feedback: Option<Feedback>,
}

impl ChatMessage {
    /// Build a fresh message row stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: Option<Uuid>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            conversation_id,
            content: content.into(),
            role,
            created_at: Utc::now(),
            feedback: None,
        }
    }
}

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation whose title is seeded from its first message.
    pub fn started_by(user_id: impl Into<String>, first_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            title: seed_title(first_message),
            created_at: now,
            updated_at: now,
        }
    }
}

/// First [`TITLE_SEED_CHARS`] characters of a message, trimmed.
///
/// Counts chars rather than bytes so multi-byte text is never split.
pub fn seed_title(message: &str) -> Option<String> {
    let title: String = message.trim().chars().take(TITLE_SEED_CHARS).collect();
    let title = title.trim_end();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Successful response of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub success: bool,
    pub conversation_id: String,
}

/// Body of `PUT /api/messages/{id}/feedback`. `null` clears the reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackUpdate {
    pub feedback: Option<Feedback>,
}

/// Body of `PATCH /api/messages/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUpdate {
    pub content: String,
}

/// A message as listed by `GET /api/messages`.
///
/// Assistant rows carry the server-side rendering of their markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_id: Option<Uuid>,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
}

impl MessageView {
    pub fn new(message: ChatMessage, content_html: Option<String>) -> Self {
        Self {
            id: message.id,
            user_id: message.user_id,
            conversation_id: message.conversation_id,
            content: message.content,
            role: message.role,
            created_at: message.created_at,
            feedback: message.feedback,
            content_html,
        }
    }
}

impl From<MessageView> for ChatMessage {
    fn from(view: MessageView) -> Self {
        Self {
            id: view.id,
            user_id: view.user_id,
            conversation_id: view.conversation_id,
            content: view.content,
            role: view.role,
            created_at: view.created_at,
            feedback: view.feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_feedback_parse_is_case_insensitive() {
        assert_eq!("UP".parse::<Feedback>().unwrap(), Feedback::Up);
        assert_eq!("down".parse::<Feedback>().unwrap(), Feedback::Down);
        assert!("sideways".parse::<Feedback>().is_err());
    }

    #[test]
    fn test_seed_title_truncates_to_thirty_chars() {
        let title = seed_title("How do I write an async trait in Rust today?").unwrap();
        // 30 chars end on a space, which is trimmed away.
        assert_eq!(title, "How do I write an async trait");

        let title = seed_title("abcdefghijklmnopqrstuvwxyz0123456789").unwrap();
        assert_eq!(title, "abcdefghijklmnopqrstuvwxyz0123");
    }

    #[test]
    fn test_seed_title_counts_chars_not_bytes() {
        let message = "Xin chào, tôi muốn hỏi về lập trình Rust";
        let title = seed_title(message).unwrap();
        assert!(title.chars().count() <= 30);
        assert!(message.starts_with(&title));
    }

    #[test]
    fn test_seed_title_blank_is_none() {
        assert_eq!(seed_title("   "), None);
    }

    #[test]
    fn test_chat_request_uses_camel_case() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","conversationId":"abc"}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.conversation_id.as_deref(), Some("abc"));

        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.message.is_empty());
        assert!(req.conversation_id.is_none());
    }

    #[test]
    fn test_feedback_update_null_clears() {
        let update: FeedbackUpdate = serde_json::from_str(r#"{"feedback":null}"#).unwrap();
        assert_eq!(update.feedback, None);
        let update: FeedbackUpdate = serde_json::from_str(r#"{"feedback":"up"}"#).unwrap();
        assert_eq!(update.feedback, Some(Feedback::Up));
    }

    #[test]
    fn test_message_view_skips_missing_html() {
        let message = ChatMessage::new("u1", None, MessageRole::User, "hello");
        let json = serde_json::to_value(MessageView::new(message, None)).unwrap();
        assert!(json.get("contentHtml").is_none());
        assert_eq!(json["role"], "user");
    }
}
