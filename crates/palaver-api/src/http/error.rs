//! Application error type mapping to HTTP status codes and `{ "error" }` bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use palaver_types::error::{AuthError, ChatError};

const INTERNAL_ERROR: &str = "Internal server error";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Anything the chat service reports.
    Chat(ChatError),
    /// Request shape problems caught before the service runs.
    BadRequest(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Chat(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, public_message(e))
            }
        }
    }
}

/// Body text for a service error. Internal failures are logged with their
/// stage and reported generically.
fn public_message(e: &ChatError) -> String {
    match e {
        ChatError::Validation(msg) => msg.clone(),
        ChatError::Auth(AuthError::MissingCredential | AuthError::MalformedCredential) => {
            "Missing or invalid authorization header".to_string()
        }
        ChatError::Auth(_) => "Unauthorized".to_string(),
        ChatError::Storage { stage, .. } => {
            tracing::error!(stage = %stage, error = %e, "Storage failure");
            INTERNAL_ERROR.to_string()
        }
        ChatError::Inference(_) => {
            tracing::error!(error = %e, "Inference failure");
            INTERNAL_ERROR.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}
