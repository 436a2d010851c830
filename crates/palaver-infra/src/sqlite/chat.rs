//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `palaver-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC 3339 timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use palaver_core::chat::repository::ChatRepository;
use palaver_types::chat::{ChatMessage, Conversation, Feedback, MessageRole};
use palaver_types::error::RepositoryError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    user_id: String,
    title: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_uuid(&self.id, "conversation id")?,
            user_id: self.user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    user_id: String,
    conversation_id: Option<String>,
    content: String,
    role: String,
    created_at: String,
    feedback: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            conversation_id: row.try_get("conversation_id")?,
            content: row.try_get("content")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
            feedback: row.try_get("feedback")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let feedback = self
            .feedback
            .as_deref()
            .map(|f| f.parse::<Feedback>())
            .transpose()
            .map_err(RepositoryError::Query)?;
        let conversation_id = self
            .conversation_id
            .as_deref()
            .map(|id| parse_uuid(id, "conversation_id"))
            .transpose()?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            user_id: self.user_id,
            conversation_id,
            content: self.content,
            role,
            created_at: parse_datetime(&self.created_at)?,
            feedback,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn expect_affected(result: sqlx::sqlite::SqliteQueryResult) -> Result<(), RepositoryError> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_err)?;
                Ok(Some(conversation_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn touch_conversation(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        expect_affected(result)
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation_row = ConversationRow::from_row(row).map_err(query_err)?;
            conversations.push(conversation_row.into_conversation()?);
        }

        Ok(conversations)
    }

    async fn delete_conversation(&self, user_id: &str, id: &Uuid) -> Result<(), RepositoryError> {
        // Messages go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM conversations WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        expect_affected(result)
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (id, user_id, conversation_id, content, role, created_at, feedback)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&message.user_id)
        .bind(message.conversation_id.map(|id| id.to_string()))
        .bind(&message.content)
        .bind(message.role.to_string())
        .bind(format_datetime(&message.created_at))
        .bind(message.feedback.map(|f| f.to_string()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let message_row = MessageRow::from_row(&row).map_err(query_err)?;
                Ok(Some(message_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn list_messages(
        &self,
        user_id: &str,
        conversation_id: Option<&Uuid>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = match conversation_id {
            Some(conversation_id) => {
                sqlx::query(
                    r#"SELECT * FROM messages
                       WHERE user_id = ? AND conversation_id = ?
                       ORDER BY created_at ASC, id ASC"#,
                )
                .bind(user_id)
                .bind(conversation_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM messages WHERE user_id = ? ORDER BY created_at ASC, id ASC",
                )
                .bind(user_id)
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row = MessageRow::from_row(row).map_err(query_err)?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn update_message_content(&self, id: &Uuid, content: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE messages SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        expect_affected(result)
    }

    async fn set_feedback(&self, id: &Uuid, feedback: Option<Feedback>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE messages SET feedback = ? WHERE id = ?")
            .bind(feedback.map(|f| f.to_string()))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        expect_affected(result)
    }
}
