// Standalone MCP server binary

use anyhow::Result;
use knowbase_core::storage::RedbArticleStore;
use knowbase_mcp::{GatewayConfig, McpGateway, McpServer};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the protocol channel, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Knowbase MCP Server starting...");

    let data_dir = std::env::var("KNOWBASE_DATA_DIR")
        .unwrap_or_else(|_| "./data".to_string());
    let data_path = PathBuf::from(data_dir);

    let store = Arc::new(RedbArticleStore::new(data_path.join("articles.redb"))?);
    let gateway = Arc::new(McpGateway::new(store, &GatewayConfig::default()));

    let server = McpServer::new(gateway);
    server.start().await?;

    Ok(())
}
