//! Axum router configuration with middleware.
//!
//! Routes live under `/api/`, plus an unauthenticated `/health`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.server.cors_permissive {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::send_chat))
        .route("/messages", get(handlers::messages::list_messages))
        .route("/messages/{id}", patch(handlers::messages::edit_message))
        .route(
            "/messages/{id}/feedback",
            put(handlers::messages::set_feedback),
        )
        .route(
            "/conversations",
            get(handlers::conversations::list_conversations),
        )
        .route(
            "/conversations/{id}",
            delete(handlers::conversations::delete_conversation),
        )
        .route("/profile", get(handlers::profile::get_profile));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
