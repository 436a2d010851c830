//! Chat persistence port and the chat request handler.
//!
//! `ChatRepository` is implemented by the infrastructure layer; `ChatService`
//! is the one server-side orchestration path (verify, persist, infer, persist).

pub mod repository;
pub mod service;
