//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/conversations      - Caller's conversations, newest first
//! - DELETE /api/conversations/{id} - Delete a conversation and its messages

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use palaver_types::chat::Conversation;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authorization;
use crate::state::AppState;

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: Authorization,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = state.chat_service.conversations(auth.as_deref()).await?;
    Ok(Json(conversations))
}

/// DELETE /api/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    auth: Authorization,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .chat_service
        .delete_conversation(auth.as_deref(), &id)
        .await?;
    Ok(Json(json!({ "deleted": true })))
}
