use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier for an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub u64);

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: Option<String>,
    pub category: Option<String>,
    /// Comma-separated, see [`Article::tag_list`]
    pub tags: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_published: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Tags split on commas, trimmed, empty entries dropped
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Published and not soft-deleted
    pub fn is_visible(&self) -> bool {
        self.is_published && !self.is_deleted()
    }
}

/// Article fields before the store assigns an identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_published: bool,
}

impl NewArticle {
    pub fn into_article(self, id: ArticleId) -> Article {
        Article {
            id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            author: self.author,
            category: self.category,
            tags: self.tags,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_published: self.is_published,
            deleted_at: None,
        }
    }
}

/// Visibility and category filter applied by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub published_only: bool,
    pub include_deleted: bool,
    pub category: Option<String>,
}

impl ArticleFilter {
    /// Published, not deleted, any category
    pub fn visible() -> Self {
        Self {
            published_only: true,
            include_deleted: false,
            category: None,
        }
    }

    /// Every article that has not been soft-deleted
    pub fn all() -> Self {
        Self {
            published_only: false,
            include_deleted: false,
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Checks published-only, then not-deleted, then category
    pub fn matches(&self, article: &Article) -> bool {
        if self.published_only && !article.is_published {
            return false;
        }
        if !self.include_deleted && article.is_deleted() {
            return false;
        }
        match &self.category {
            Some(category) => article.category.as_deref() == Some(category.as_str()),
            None => true,
        }
    }
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self::visible()
    }
}

/// Result ordering for store listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleOrder {
    /// Most recently published first, undated articles last
    #[default]
    PublishedDesc,
}

impl ArticleOrder {
    pub fn sort(self, articles: &mut [Article]) {
        match self {
            // Option orders None below Some, so a descending compare puts undated last
            Self::PublishedDesc => articles.sort_by(|a, b| {
                b.published_at
                    .cmp(&a.published_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
    }
}

/// Lowercase ASCII letters, digits and hyphens, at least one character
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
