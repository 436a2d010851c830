//! HTTP/REST API layer for Palaver.
//!
//! Axum routes under `/api/` with bearer-token authentication done by the
//! chat service, `{ "error": ... }` error bodies and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
