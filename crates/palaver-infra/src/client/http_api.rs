//! HttpChatApi -- reqwest implementation of [`ChatApi`] against the Palaver
//! REST surface.
//!
//! Every call carries the session's bearer token. Non-2xx responses become
//! [`ClientError::Http`] with the message from the `{ "error": ... }` body.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use palaver_core::view::ChatApi;
use palaver_types::chat::{
    ChatReply, ChatRequest, ContentUpdate, Conversation, Feedback, FeedbackUpdate, MessageView,
};
use palaver_types::error::ClientError;
use palaver_types::identity::UserProfile;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        // Inference can take a while; the server holds the request until it finishes.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        tracing::debug!(status = status.as_u16(), %message, "chat API request failed");
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl ChatApi for HttpChatApi {
    async fn send(&self, token: &str, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.json(
            self.client
                .post(self.url("/api/chat"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }

    async fn history(
        &self,
        token: &str,
        conversation_id: Option<&Uuid>,
    ) -> Result<Vec<MessageView>, ClientError> {
        let mut request = self.client.get(self.url("/api/messages")).bearer_auth(token);
        if let Some(id) = conversation_id {
            request = request.query(&[("conversationId", id.to_string())]);
        }
        self.json(request).await
    }

    async fn conversations(&self, token: &str) -> Result<Vec<Conversation>, ClientError> {
        self.json(self.client.get(self.url("/api/conversations")).bearer_auth(token))
            .await
    }

    async fn set_feedback(
        &self,
        token: &str,
        message_id: &Uuid,
        feedback: Option<Feedback>,
    ) -> Result<MessageView, ClientError> {
        self.json(
            self.client
                .put(self.url(&format!("/api/messages/{message_id}/feedback")))
                .bearer_auth(token)
                .json(&FeedbackUpdate { feedback }),
        )
        .await
    }

    async fn edit_message(
        &self,
        token: &str,
        message_id: &Uuid,
        content: &str,
    ) -> Result<MessageView, ClientError> {
        self.json(
            self.client
                .patch(self.url(&format!("/api/messages/{message_id}")))
                .bearer_auth(token)
                .json(&ContentUpdate {
                    content: content.to_string(),
                }),
        )
        .await
    }

    async fn delete_conversation(&self, token: &str, conversation_id: &Uuid) -> Result<(), ClientError> {
        self.execute(
            self.client
                .delete(self.url(&format!("/api/conversations/{conversation_id}")))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }

    async fn profile(&self, token: &str) -> Result<UserProfile, ClientError> {
        self.json(self.client.get(self.url("/api/profile")).bearer_auth(token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::Json;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, patch, post, put};
    use chrono::Utc;
    use palaver_types::chat::MessageRole;
    use std::collections::HashMap;

    const TOKEN: &str = "plv_test";

    type Reply = (StatusCode, Json<serde_json::Value>);

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer plv_test")
    }

    fn unauthorized() -> Reply {
        (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "Unauthorized"})))
    }

    fn message_json(id: &str, role: &str, content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "userId": "user-1",
            "conversationId": null,
            "content": content,
            "role": role,
            "createdAt": Utc::now(),
            "feedback": null
        })
    }

    async fn chat(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        let message = body["message"].as_str().unwrap_or_default();
        if message.trim().is_empty() {
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": "Message is required"})));
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("echo: {message}"),
                "success": true,
                "conversationId": body["conversationId"].as_str().unwrap_or("0192b0a0-0000-7000-8000-000000000001")
            })),
        )
    }

    async fn messages(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        let content = query
            .get("conversationId")
            .map(|id| format!("in {id}"))
            .unwrap_or_else(|| "all".to_string());
        (
            StatusCode::OK,
            Json(serde_json::json!([message_json(
                "0192b0a0-0000-7000-8000-0000000000aa",
                "user",
                &content
            )])),
        )
    }

    async fn feedback(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<serde_json::Value>) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        let mut message = message_json(&id, "assistant", "hi");
        message["feedback"] = body["feedback"].clone();
        (StatusCode::OK, Json(message))
    }

    async fn edit(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<serde_json::Value>) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        let content = body["content"].as_str().unwrap_or_default();
        (StatusCode::OK, Json(message_json(&id, "user", content)))
    }

    async fn remove(headers: HeaderMap) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        (StatusCode::OK, Json(serde_json::json!({"deleted": true})))
    }

    async fn profile(headers: HeaderMap) -> Reply {
        if !authorized(&headers) {
            return unauthorized();
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({"id": "user-1", "email": "lan@example.com", "display_name": "Lan"})),
        )
    }

    async fn api() -> HttpChatApi {
        let router = axum::Router::new()
            .route("/api/chat", post(chat))
            .route("/api/messages", get(messages))
            .route("/api/messages/{id}", patch(edit))
            .route("/api/messages/{id}/feedback", put(feedback))
            .route("/api/conversations", get(|| async { Json(serde_json::json!([])) }))
            .route("/api/conversations/{id}", delete(remove))
            .route("/api/profile", get(profile))
            .route("/api/broken", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
        HttpChatApi::new(format!("{}/", test_server::spawn(router).await)).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_reply() {
        let api = api().await;
        let reply = api
            .send(
                TOKEN,
                &ChatRequest {
                    message: "hello".into(),
                    conversation_id: None,
                },
            )
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.message, "echo: hello");
        assert!(!reply.conversation_id.is_empty());
    }

    #[tokio::test]
    async fn test_error_body_becomes_http_error() {
        let api = api().await;
        let err = api
            .send(TOKEN, &ChatRequest::default())
            .await
            .unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Message is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = api.profile("wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_non_json_error_uses_status_reason() {
        let api = api().await;
        let err = api
            .execute(api.client.get(api.url("/api/broken")))
            .await
            .unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_history_passes_conversation_filter() {
        let api = api().await;
        let all = api.history(TOKEN, None).await.unwrap();
        assert_eq!(all[0].content, "all");

        let id = Uuid::now_v7();
        let scoped = api.history(TOKEN, Some(&id)).await.unwrap();
        assert_eq!(scoped[0].content, format!("in {id}"));
        assert_eq!(scoped[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_message_mutations() {
        let api = api().await;
        let id = Uuid::now_v7();

        let updated = api.set_feedback(TOKEN, &id, Some(Feedback::Down)).await.unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.feedback, Some(Feedback::Down));

        let cleared = api.set_feedback(TOKEN, &id, None).await.unwrap();
        assert_eq!(cleared.feedback, None);

        let edited = api.edit_message(TOKEN, &id, "fixed typo").await.unwrap();
        assert_eq!(edited.content, "fixed typo");

        api.delete_conversation(TOKEN, &id).await.unwrap();
        assert!(api.conversations(TOKEN).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_and_transport_errors() {
        let api = api().await;
        let user = api.profile(TOKEN).await.unwrap();
        assert_eq!(user.display_label(), "Lan");

        let offline = HttpChatApi::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            offline.profile(TOKEN).await,
            Err(ClientError::Transport(_))
        ));
    }
}
