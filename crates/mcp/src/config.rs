use knowbase_core::query::MAX_PER_PAGE;
use serde::{Deserialize, Serialize};

/// Gateway settings, usually the `[gateway]` table of the server config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Reported as `serverInfo.name` by `initialize`
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Length of resource descriptions and search previews
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Results returned by one `search_articles` call
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

fn default_server_name() -> String {
    "Knowledge Base MCP Server".to_string()
}

fn default_preview_chars() -> usize {
    200
}

fn default_search_page_size() -> usize {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            preview_chars: default_preview_chars(),
            search_page_size: default_search_page_size(),
        }
    }
}

impl GatewayConfig {
    /// Search page size clamped to what the query engine accepts
    pub fn effective_search_page_size(&self) -> usize {
        self.search_page_size.clamp(1, MAX_PER_PAGE)
    }
}
