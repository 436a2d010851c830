//! Configuration loading for Palaver.
//!
//! Reads `config.toml` (by default from the data directory) into
//! [`AppConfig`], falling back to defaults when the file is missing or
//! malformed. Secrets come from environment variables named in the config.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use palaver_types::config::AppConfig;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "PALAVER_DATA_DIR";

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority: `PALAVER_DATA_DIR`, then `data_dir` from the config, then
/// `~/.palaver`.
pub fn resolve_data_dir(config: Option<&AppConfig>) -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Some(dir) = config
        .and_then(|c| c.data_dir.clone())
        .filter(|d| !d.as_os_str().is_empty())
    {
        return dir;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".palaver")
}

/// Default config file location inside the data directory.
pub fn default_config_path() -> PathBuf {
    resolve_data_dir(None).join("config.toml")
}

/// An optional string setting, with a blank value (`url = ""`) treated as unset.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read a secret from the named environment variable. Empty counts as unset.
pub fn resolve_secret(env_name: &str) -> Option<SecretString> {
    match std::env::var(env_name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(env = env_name, "Ignoring non-UTF-8 secret value");
            None
        }
    }
}
