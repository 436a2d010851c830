//! Business logic and port trait definitions for Palaver.
//!
//! This crate defines the "ports" (repository, identity, inference, session
//! store and remote chat API traits) that the infrastructure layer implements,
//! the chat request orchestration, markup rendering, and the client-side
//! view models. It depends only on `palaver-types` -- never on
//! `palaver-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod markup;
pub mod session;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;
