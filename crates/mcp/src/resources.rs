//! Articles exposed as MCP resources.
//!
//! Resource URIs take the form `kb://article/{slug}`. The slug is the only
//! identifier accepted; numeric store ids are never part of the URI.

use crate::error::{GatewayError, GatewayResult};
use crate::format::{article_document, preview};
use crate::protocol::{ResourceContents, ResourceDescriptor};
use knowbase_core::storage::ArticleStore;
use knowbase_core::{is_valid_slug, Article, ArticleFilter, ArticleOrder};
use std::sync::Arc;

pub const ARTICLE_URI_PREFIX: &str = "kb://article/";

pub const TEXT_MIME_TYPE: &str = "text/plain";

pub fn article_uri(slug: &str) -> String {
    format!("{}{}", ARTICLE_URI_PREFIX, slug)
}

/// Extract the slug from an article URI
pub fn parse_article_uri(uri: &str) -> GatewayResult<&str> {
    let slug = uri.strip_prefix(ARTICLE_URI_PREFIX).ok_or_else(|| {
        GatewayError::invalid_params(format!(
            "Invalid URI format. Expected: {}{{slug}}",
            ARTICLE_URI_PREFIX
        ))
    })?;

    if !is_valid_slug(slug) {
        return Err(GatewayError::invalid_params(
            "Invalid article slug in URI: must contain only lowercase letters, numbers, and hyphens",
        ));
    }

    Ok(slug)
}

/// Maps visible articles to resource descriptors and back
#[derive(Clone)]
pub struct ResourceCatalog {
    store: Arc<dyn ArticleStore>,
    preview_chars: usize,
}

impl ResourceCatalog {
    pub fn new(store: Arc<dyn ArticleStore>, preview_chars: usize) -> Self {
        Self {
            store,
            preview_chars,
        }
    }

    /// Every visible article, most recently published first
    pub fn list(&self) -> GatewayResult<Vec<ResourceDescriptor>> {
        let articles = self
            .store
            .list(&ArticleFilter::visible(), ArticleOrder::PublishedDesc)?;

        Ok(articles.iter().map(|a| self.descriptor(a)).collect())
    }

    pub fn descriptor(&self, article: &Article) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: article_uri(&article.slug),
            name: article.title.clone(),
            description: preview(&article.content, self.preview_chars),
            mime_type: TEXT_MIME_TYPE.to_string(),
        }
    }

    /// Resolve a URI to the full text of a visible article
    pub fn read(&self, uri: &str) -> GatewayResult<ResourceContents> {
        let slug = parse_article_uri(uri)?;
        let article = self
            .find_visible(slug)?
            .ok_or_else(|| GatewayError::article_not_found("uri", uri))?;

        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: TEXT_MIME_TYPE.to_string(),
            text: article_document(&article),
        })
    }

    /// The published, non-deleted article with this slug
    pub fn find_visible(&self, slug: &str) -> GatewayResult<Option<Article>> {
        Ok(self
            .store
            .find_by_slug(slug)?
            .filter(Article::is_visible))
    }
}
