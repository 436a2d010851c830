use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in palaver-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Why a bearer credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredential,

    #[error("malformed authorization header")]
    MalformedCredential,

    #[error("invalid or expired credential")]
    InvalidCredential,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Which storage step failed. Only ever logged.
///
/// The first three are the writes of a chat exchange. `Lookup` covers reads
/// (history, conversation and message ownership checks) and `Update` covers
/// feedback, edits and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStage {
    Conversation,
    UserMessage,
    AssistantMessage,
    Lookup,
    Update,
}

impl std::fmt::Display for StorageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StorageStage::Conversation => "conversation",
            StorageStage::UserMessage => "user_message",
            StorageStage::AssistantMessage => "assistant_message",
            StorageStage::Lookup => "lookup",
            StorageStage::Update => "update",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of a chat request. None of these are retried.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("storage error during {stage}: {source}")]
    Storage {
        stage: StorageStage,
        #[source]
        source: RepositoryError,
    },

    #[error("inference error: {0}")]
    Inference(#[from] LlmError),
}

impl ChatError {
    pub fn storage(stage: StorageStage, source: RepositoryError) -> Self {
        ChatError::Storage { stage, source }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Validation(_) => 400,
            ChatError::Auth(_) => 401,
            ChatError::Storage { .. } | ChatError::Inference(_) => 500,
        }
    }
}

/// Errors seen by the client-side views.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("session store error: {0}")]
    Session(String),

    #[error("{0}")]
    Rejected(String),
}

impl ClientError {
    /// A 401 from the server means the stored session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Http { status: 401, .. } | ClientError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_status_codes() {
        assert_eq!(ChatError::Validation("empty".into()).status_code(), 400);
        assert_eq!(ChatError::from(AuthError::MissingCredential).status_code(), 401);
        assert_eq!(
            ChatError::storage(StorageStage::UserMessage, RepositoryError::Connection)
                .status_code(),
            500
        );
        assert_eq!(ChatError::from(LlmError::EmptyResponse).status_code(), 500);
    }

    #[test]
    fn test_storage_error_names_stage() {
        let err = ChatError::storage(
            StorageStage::AssistantMessage,
            RepositoryError::Query("disk full".into()),
        );
        assert!(err.to_string().contains("assistant_message"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_client_error_unauthorized() {
        let err = ClientError::Http {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert!(err.is_unauthorized());
        assert!(!ClientError::Transport("refused".into()).is_unauthorized());
    }
}
