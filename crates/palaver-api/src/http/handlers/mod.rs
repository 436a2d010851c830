//! HTTP request handlers for the REST API.

pub mod chat;
pub mod conversations;
pub mod messages;
pub mod profile;

use axum::extract::rejection::JsonRejection;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authorization;
use crate::state::AppState;

/// Error for a body that did not deserialize. The caller is authenticated
/// first so an anonymous request still gets 401.
pub(crate) async fn invalid_body(
    state: &AppState,
    auth: &Authorization,
    rejection: JsonRejection,
) -> AppError {
    if let Err(e) = state.chat_service.authenticate(auth.as_deref()).await {
        return e.into();
    }
    tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
    AppError::BadRequest("Invalid request body".to_string())
}
