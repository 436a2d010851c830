//! Infrastructure implementations for Palaver.
//!
//! Concrete adapters for the ports defined in `palaver-core`: SQLite
//! persistence, identity providers, hosted inference providers, and the
//! client-side HTTP chat API and session file.

pub mod auth;
pub mod client;
pub mod config;
pub mod llm;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_server;
