use anyhow::{Context, Result};
use knowbase_core::articles::ArticleService;
use knowbase_core::query::QueryEngine;
use knowbase_core::storage::RedbArticleStore;
use knowbase_mcp::{GatewayConfig, McpGateway};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

fn default_index_file() -> String {
    "articles.redb".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_file: default_index_file(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path, data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            Self::parse(&content)?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::defaults(data_dir.clone())
        };

        config.data_dir = data_dir;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration file")
    }

    pub fn defaults(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            storage: StorageConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }

    /// Get the article index file path
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.index_file)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RedbArticleStore>,
    pub articles: ArticleService,
    pub engine: QueryEngine,
    pub gateway: Arc<McpGateway>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = Arc::new(
            RedbArticleStore::new(config.index_path()).context("Failed to create article store")?,
        );

        Ok(Self::from_store(store, &config.gateway))
    }

    pub fn from_store(store: Arc<RedbArticleStore>, gateway: &GatewayConfig) -> Self {
        Self {
            articles: ArticleService::new(store.clone()),
            engine: QueryEngine::new(store.clone()),
            gateway: Arc::new(McpGateway::new(store.clone(), gateway)),
            store,
        }
    }
}
