// Single-article lookup by slug

use crate::error::{GatewayError, GatewayResult};
use crate::format::article_document;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::resources::ResourceCatalog;
use crate::tools::{json_schema_object, json_schema_string, required_exact_string, Tool};
use knowbase_core::is_valid_slug;

pub const GET_ARTICLE: &str = "get_article";

/// Tool to fetch one published article by its slug
pub struct GetArticleTool {
    catalog: ResourceCatalog,
}

impl GetArticleTool {
    pub fn new(catalog: ResourceCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait::async_trait]
impl Tool for GetArticleTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_ARTICLE.to_string(),
            description: "Get a specific article by slug".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "slug": json_schema_string("Article slug")
                }),
                vec!["slug"],
            ),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<CallToolResult> {
        // Slugs are matched as sent, so surrounding whitespace is a format error
        let slug = required_exact_string(&arguments, "slug")?;
        if !is_valid_slug(slug) {
            return Err(GatewayError::invalid_params(
                "Slug must contain only lowercase letters, numbers, and hyphens",
            ));
        }

        let article = self
            .catalog
            .find_visible(slug)?
            .ok_or_else(|| GatewayError::article_not_found("slug", slug))?;

        Ok(CallToolResult::text(article_document(&article)))
    }
}
