//! Shared domain types for Palaver.
//!
//! Messages, conversations, identity records, the inference request shapes,
//! configuration, and the error taxonomy shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
