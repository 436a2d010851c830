//! LLM provider abstraction.
//!
//! `LlmProvider` is the inference port (prompt in, completion out);
//! `BoxLlmProvider` erases the concrete provider for config-driven selection.

pub mod box_provider;
pub mod provider;
