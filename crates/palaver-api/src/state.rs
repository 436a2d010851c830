//! Application state wiring services together.
//!
//! [`AppState`] is the server side: database, identity provider, inference
//! provider and the chat service pinned to the SQLite repository.
//! [`ClientState`] is the terminal client: the session file and the HTTP
//! chat API pointed at `client.server_url`. Client commands never open the
//! database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use palaver_core::chat::service::ChatService;
use palaver_core::markup::MarkupMode;
use palaver_infra::auth::{create_identity_provider, gotrue_provider};
use palaver_infra::client::{FileSessionStore, HttpChatApi};
use palaver_infra::config::{
    default_config_path, load_config, non_empty, resolve_data_dir, resolve_secret,
};
use palaver_infra::llm::create_provider;
use palaver_infra::sqlite::api_keys::SqliteApiKeyStore;
use palaver_infra::sqlite::chat::SqliteChatRepository;
use palaver_infra::sqlite::pool::{DatabasePool, database_url_for};
use palaver_types::config::{AppConfig, AuthProviderKind};

/// The chat service pinned to the concrete repository.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

/// Load `config.toml` from `path`, or from the data directory when absent.
pub async fn load_app_config(path: Option<&Path>) -> AppConfig {
    match path {
        Some(path) => load_config(path).await,
        None => load_config(&default_config_path()).await,
    }
}

/// Shared server state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub markup: MarkupMode,
    pub keys: SqliteApiKeyStore,
    pub db_pool: DatabasePool,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Connect to the database and wire the configured providers.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir(Some(&config));
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db_url = non_empty(config.database_url.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| database_url_for(&data_dir));
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database at {db_url}"))?;

        let keys = SqliteApiKeyStore::new(db_pool.clone());
        let identity = create_identity_provider(
            &config.auth,
            resolve_secret(&config.auth.anon_key_env),
            keys.clone(),
        )?;
        let llm = create_provider(&config.inference, resolve_secret(&config.inference.api_key_env))?;

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            identity,
            llm,
            config.inference.max_tokens,
        );

        Ok(Self::from_parts(chat_service, keys, db_pool, config, data_dir))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        chat_service: ConcreteChatService,
        keys: SqliteApiKeyStore,
        db_pool: DatabasePool,
        config: AppConfig,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            chat_service: Arc::new(chat_service),
            markup: MarkupMode::from_escape_flag(config.markup.escape_html),
            keys,
            db_pool,
            config: Arc::new(config),
            data_dir,
        }
    }
}

/// Terminal client state: where the session lives and which server to talk to.
pub struct ClientState {
    pub store: Arc<FileSessionStore>,
    pub api: Arc<HttpChatApi>,
    pub markup: MarkupMode,
    pub config: AppConfig,
}

impl ClientState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir(Some(&config));
        let api = HttpChatApi::new(config.client.server_url.clone())?;

        let mut store = FileSessionStore::new(&data_dir, api.clone());
        if config.auth.provider == AuthProviderKind::Gotrue {
            match gotrue_provider(&config.auth, resolve_secret(&config.auth.anon_key_env)) {
                Ok(gotrue) => store = store.with_gotrue(gotrue),
                Err(e) => tracing::warn!(error = %e, "Password sign-in unavailable"),
            }
        }

        Ok(Self {
            store: Arc::new(store),
            api: Arc::new(api),
            markup: MarkupMode::from_escape_flag(config.markup.escape_html),
            config,
        })
    }
}
