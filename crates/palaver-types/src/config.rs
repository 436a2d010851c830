//! Configuration types for Palaver.
//!
//! `AppConfig` is the top-level `config.toml`. Every section and field has a
//! default so an empty (or missing) file yields a working local setup. Secret
//! values never appear here: the file names the environment variable that
//! holds each key.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the data directory (`PALAVER_DATA_DIR` still wins).
    pub data_dir: Option<PathBuf>,
    /// Overrides the SQLite URL (defaults to `{data_dir}/palaver.db`).
    pub database_url: Option<String>,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub inference: InferenceConfig,
    pub markup: MarkupConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Allow any origin, method and header.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_permissive: true,
        }
    }
}

/// Which identity provider verifies bearer tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    /// Local users with API keys stored in SQLite.
    #[default]
    Local,
    /// A GoTrue-compatible auth server (Supabase).
    Gotrue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub provider: AuthProviderKind,
    /// Base URL of the GoTrue server, e.g. `https://<project>.supabase.co`.
    pub url: Option<String>,
    /// Environment variable holding the public anon key.
    pub anon_key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: AuthProviderKind::Local,
            url: None,
            anon_key_env: "PALAVER_AUTH_ANON_KEY".to_string(),
        }
    }
}

/// Which hosted model backs the chat handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceProviderKind {
    #[default]
    Gemini,
    Anthropic,
    /// Fixed placeholder replies, no network.
    Canned,
}

impl std::fmt::Display for InferenceProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceProviderKind::Gemini => write!(f, "gemini"),
            InferenceProviderKind::Anthropic => write!(f, "anthropic"),
            InferenceProviderKind::Canned => write!(f, "canned"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub provider: InferenceProviderKind,
    pub model: String,
    /// Environment variable holding the provider API key.
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: InferenceProviderKind::Gemini,
            model: "gemini-2.0-flash-exp".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// HTML-escape message text before applying markup. Turning this off
    /// reproduces the legacy substitution that lets raw HTML through.
    pub escape_html: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self { escape_html: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel_stdout: bool,
}
