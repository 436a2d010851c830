//! Message HTTP handlers.
//!
//! Endpoints:
//! - GET   /api/messages?conversationId=   - Caller's messages, oldest first
//! - PATCH /api/messages/{id}              - Edit a user message
//! - PUT   /api/messages/{id}/feedback     - Set or clear a reaction

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use palaver_core::markup;
use palaver_types::chat::{ChatMessage, ContentUpdate, FeedbackUpdate, MessageRole, MessageView};

use super::invalid_body;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authorization;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListQuery {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Assistant rows carry their rendered markup.
fn to_view(state: &AppState, message: ChatMessage) -> MessageView {
    let html = (message.role == MessageRole::Assistant)
        .then(|| markup::render_html(&message.content, state.markup));
    MessageView::new(message, html)
}

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: Authorization,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = state
        .chat_service
        .history(auth.as_deref(), query.conversation_id.as_deref())
        .await?;
    Ok(Json(
        messages.into_iter().map(|m| to_view(&state, m)).collect(),
    ))
}

/// PATCH /api/messages/{id}
pub async fn edit_message(
    State(state): State<AppState>,
    auth: Authorization,
    Path(id): Path<String>,
    body: Result<Json<ContentUpdate>, JsonRejection>,
) -> Result<Json<MessageView>, AppError> {
    let update = match body {
        Ok(Json(update)) => update,
        Err(rejection) => return Err(invalid_body(&state, &auth, rejection).await),
    };

    let message = state
        .chat_service
        .edit_message(auth.as_deref(), &id, update.content)
        .await?;
    Ok(Json(to_view(&state, message)))
}

/// PUT /api/messages/{id}/feedback
pub async fn set_feedback(
    State(state): State<AppState>,
    auth: Authorization,
    Path(id): Path<String>,
    body: Result<Json<FeedbackUpdate>, JsonRejection>,
) -> Result<Json<MessageView>, AppError> {
    let update = match body {
        Ok(Json(update)) => update,
        Err(rejection) => return Err(invalid_body(&state, &auth, rejection).await),
    };

    let message = state
        .chat_service
        .set_feedback(auth.as_deref(), &id, update.feedback)
        .await?;
    Ok(Json(to_view(&state, message)))
}
