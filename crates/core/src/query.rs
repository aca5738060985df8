//! Filtered, ordered and paginated views over an [`ArticleStore`].
//!
//! The same engine serves free-text search and plain listing. A query with no
//! text walks the filtered set directly; a query with text keeps only the
//! articles whose title or content contains every search term.

use crate::storage::ArticleStore;
use crate::types::{Article, ArticleFilter, ArticleOrder};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PER_PAGE: usize = 20;

/// Upper bound on page size
pub const MAX_PER_PAGE: usize = 100;

/// A search or listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// `None` or empty lists the filtered set without text matching
    pub text: Option<String>,
    pub filter: ArticleFilter,
    pub page: i64,
    pub per_page: i64,
}

impl SearchQuery {
    /// Text search over visible articles, first page
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::listing()
        }
    }

    /// Listing of visible articles, first page
    pub fn listing() -> Self {
        Self {
            text: None,
            filter: ArticleFilter::visible(),
            page: 1,
            per_page: DEFAULT_PER_PAGE as i64,
        }
    }

    pub fn with_filter(mut self, filter: ArticleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.filter.category = category;
        self
    }

    pub fn with_page(mut self, page: i64, per_page: i64) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }
}

/// Page number and size after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Clamp page to at least 1 and page size to `1..=MAX_PER_PAGE`
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: usize::try_from(page.max(1)).unwrap_or(usize::MAX),
            per_page: usize::try_from(per_page.clamp(1, MAX_PER_PAGE as i64))
                .unwrap_or(MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn meta(&self, total: usize) -> PaginationMeta {
        PaginationMeta {
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: total.div_ceil(self.per_page),
        }
    }
}

/// Pagination metadata computed from the full match count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// One page of results plus metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub articles: Vec<Article>,
    pub meta: PaginationMeta,
}

/// Query engine over an article store
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ArticleStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    pub fn find(&self, query: &SearchQuery) -> Result<SearchResults> {
        let pagination = Pagination::new(query.page, query.per_page);

        let matched: Vec<Article> = match query.text.as_deref().filter(|t| !t.is_empty()) {
            Some(text) => {
                let terms = search_terms(text);
                if terms.is_empty() {
                    Vec::new()
                } else {
                    self.store
                        .list(&query.filter, ArticleOrder::PublishedDesc)?
                        .into_iter()
                        .filter(|article| matches_terms(article, &terms))
                        .collect()
                }
            }
            None => self.store.list(&query.filter, ArticleOrder::PublishedDesc)?,
        };

        let meta = pagination.meta(matched.len());
        let articles = matched
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.per_page)
            .collect();

        tracing::debug!(
            total = meta.total,
            page = meta.page,
            per_page = meta.per_page,
            "Query executed"
        );

        Ok(SearchResults { articles, meta })
    }
}

/// Drop everything except alphanumerics and whitespace
pub fn sanitize_query(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Lowercased terms of the sanitized query
pub fn search_terms(text: &str) -> Vec<String> {
    sanitize_query(text)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Every term must appear in the title or the content
fn matches_terms(article: &Article, terms: &[String]) -> bool {
    let title = article.title.to_lowercase();
    let content = article.content.to_lowercase();
    terms
        .iter()
        .all(|term| title.contains(term.as_str()) || content.contains(term.as_str()))
}
