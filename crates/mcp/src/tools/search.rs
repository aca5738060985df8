// Full-text search over visible articles

use crate::error::{GatewayError, GatewayResult};
use crate::format::search_digest;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_object, json_schema_string, optional_string, required_string, Tool};
use knowbase_core::query::{QueryEngine, SearchQuery};
use knowbase_core::ArticleFilter;

pub const SEARCH_ARTICLES: &str = "search_articles";

/// Longest accepted query, in characters after trimming
pub const MAX_QUERY_CHARS: usize = 255;

/// Tool to search published articles by title and content
pub struct SearchArticlesTool {
    engine: QueryEngine,
    page_size: usize,
    preview_chars: usize,
}

impl SearchArticlesTool {
    pub fn new(engine: QueryEngine, page_size: usize, preview_chars: usize) -> Self {
        Self {
            engine,
            page_size,
            preview_chars,
        }
    }
}

#[async_trait::async_trait]
impl Tool for SearchArticlesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: SEARCH_ARTICLES.to_string(),
            description: "Search for articles in the knowledge base".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Search query"),
                    "category": json_schema_string("Filter by category (optional)")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<CallToolResult> {
        let query = required_string(&arguments, "query")?;
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(GatewayError::invalid_params(format!(
                "query parameter must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }
        let category = optional_string(&arguments, "category")?;

        // Visibility is not negotiable from the tool surface
        let search = SearchQuery::text(query)
            .with_filter(ArticleFilter::visible())
            .with_category(category.map(str::to_string))
            .with_page(1, self.page_size as i64);

        let results = self.engine.find(&search)?;
        tracing::debug!(query, total = results.meta.total, "search_articles");

        Ok(CallToolResult::text(search_digest(
            query,
            &results,
            self.preview_chars,
        )))
    }
}
