//! Anthropic Claude provider (Messages API, non-streaming).

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
