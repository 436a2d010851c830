//! Chat exchange handler.
//!
//! Endpoints:
//! - POST /api/chat - Store the message, ask the model, store the reply

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use palaver_types::chat::{ChatReply, ChatRequest};

use super::invalid_body;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authorization;
use crate::state::AppState;

/// POST /api/chat
///
/// `200 {message, success: true, conversationId}` on success. The user row
/// stays stored when inference or the reply write fails.
pub async fn send_chat(
    State(state): State<AppState>,
    auth: Authorization,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return Err(invalid_body(&state, &auth, rejection).await),
    };

    let reply = state
        .chat_service
        .send_message(auth.as_deref(), request)
        .await?;
    Ok(Json(reply))
}
