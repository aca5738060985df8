//! Write-side article flows: creation, publishing and soft deletion.
//!
//! Every mutation goes through [`RedbArticleStore`], so a committed change is
//! visible to the next read through the [`ArticleStore`](crate::storage::ArticleStore)
//! contract.

use crate::storage::{RedbArticleStore, SlugInUse};
use crate::text::{generate_slug, sanitize_input, sanitize_optional};
use crate::types::{is_valid_slug, Article, ArticleId, NewArticle};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 255;
pub const CONTENT_MIN_CHARS: usize = 10;

const SLUG_TAKEN: &str = "must be unique (an article with this title already exists)";
const SLUG_REUSED: &str = "is now used by another article";

/// Field name to validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{} {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors from article write operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    #[error("Article not found: {0}")]
    NotFound(ArticleId),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ArticleResult<T> = Result<T, ArticleError>;

/// Submitted article fields, before sanitizing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// Article creation and lifecycle operations
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<RedbArticleStore>,
}

impl ArticleService {
    pub fn new(store: Arc<RedbArticleStore>) -> Self {
        Self { store }
    }

    /// Sanitize, validate and store a new article
    pub fn create(&self, input: ArticleInput) -> ArticleResult<Article> {
        let title = sanitize_input(&input.title);
        let content = sanitize_input(&input.content);

        let mut errors = ValidationErrors::default();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.add("title", "cannot be empty");
        } else if title_len < TITLE_MIN_CHARS {
            errors.add("title", format!("must be at least {} characters", TITLE_MIN_CHARS));
        } else if title_len > TITLE_MAX_CHARS {
            errors.add("title", format!("must be less than {} characters", TITLE_MAX_CHARS));
        }

        if content.is_empty() {
            errors.add("content", "cannot be empty");
        } else if content.chars().count() < CONTENT_MIN_CHARS {
            errors.add(
                "content",
                format!("must be at least {} characters", CONTENT_MIN_CHARS),
            );
        }

        let slug = generate_slug(&title);
        if !title.is_empty() && !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "must contain only lowercase letters, numbers, and hyphens",
            );
        }

        if !errors.is_empty() {
            return Err(ArticleError::Validation(errors));
        }

        if self.store.find_by_slug(&slug)?.is_some() {
            return Err(ArticleError::Validation(ValidationErrors::single("slug", SLUG_TAKEN)));
        }

        let now = Utc::now();
        // A concurrent create can still claim the slug before this commits
        let article = self
            .store
            .insert(NewArticle {
                title,
                slug,
                content,
                author: sanitize_optional(input.author.as_deref()),
                category: sanitize_optional(input.category.as_deref()),
                tags: sanitize_optional(input.tags.as_deref()),
                published_at: input.is_published.then_some(now),
                created_at: now,
                updated_at: now,
                is_published: input.is_published,
            })
            .map_err(|e| slug_conflict(e, SLUG_TAKEN))?;

        tracing::info!("Created article: {} ({})", article.slug, article.id);
        Ok(article)
    }

    pub fn get(&self, id: ArticleId) -> ArticleResult<Article> {
        self.store.get(id)?.ok_or(ArticleError::NotFound(id))
    }

    /// Publish an article; already-published articles are left unchanged
    pub fn publish(&self, id: ArticleId) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        if article.is_published {
            return Ok(article);
        }

        let now = Utc::now();
        article.is_published = true;
        article.published_at = Some(now);
        article.updated_at = now;
        self.store.update(&article)?;

        tracing::info!("Published article {}", id);
        Ok(article)
    }

    /// Unpublish an article; drafts are left unchanged
    pub fn unpublish(&self, id: ArticleId) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        if !article.is_published {
            return Ok(article);
        }

        article.is_published = false;
        article.published_at = None;
        article.updated_at = Utc::now();
        self.store.update(&article)?;

        tracing::info!("Unpublished article {}", id);
        Ok(article)
    }

    pub fn toggle(&self, id: ArticleId) -> ArticleResult<Article> {
        if self.get(id)?.is_published {
            self.unpublish(id)
        } else {
            self.publish(id)
        }
    }

    /// Mark an article deleted and release its slug
    pub fn soft_delete(&self, id: ArticleId) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        if article.is_deleted() {
            return Ok(article);
        }

        let now = Utc::now();
        article.deleted_at = Some(now);
        article.updated_at = now;
        self.store.update(&article)?;

        tracing::info!("Soft-deleted article {}", id);
        Ok(article)
    }

    /// Undo a soft delete, provided the slug was not taken in the meantime
    pub fn restore(&self, id: ArticleId) -> ArticleResult<Article> {
        let mut article = self.get(id)?;
        if !article.is_deleted() {
            return Ok(article);
        }

        if self.store.find_by_slug(&article.slug)?.is_some() {
            return Err(ArticleError::Validation(ValidationErrors::single("slug", SLUG_REUSED)));
        }

        article.deleted_at = None;
        article.updated_at = Utc::now();
        self.store
            .update(&article)
            .map_err(|e| slug_conflict(e, SLUG_REUSED))?;

        tracing::info!("Restored article {}", id);
        Ok(article)
    }
}

/// Slug clashes found at write time are validation failures, not store faults
fn slug_conflict(err: anyhow::Error, message: &str) -> ArticleError {
    if err.is::<SlugInUse>() {
        ArticleError::Validation(ValidationErrors::single("slug", message))
    } else {
        ArticleError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArticleFilter;
    use tempfile::NamedTempFile;

    fn service() -> (NamedTempFile, ArticleService) {
        let file = NamedTempFile::new().unwrap();
        let store = Arc::new(RedbArticleStore::new(file.path().to_path_buf()).unwrap());
        (file, ArticleService::new(store))
    }

    fn input(title: &str, published: bool) -> ArticleInput {
        ArticleInput {
            title: title.to_string(),
            content: "This content is long enough.".to_string(),
            author: Some(" Ada ".to_string()),
            category: Some("".to_string()),
            tags: Some("rust, mcp".to_string()),
            is_published: published,
        }
    }

    fn field_errors(err: ArticleError) -> ValidationErrors {
        match err {
            ArticleError::Validation(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_article() {
        let (_file, service) = service();

        let article = service.create(input("<em>Intro</em> to X", true)).unwrap();
        assert_eq!(article.title, "Intro to X");
        assert_eq!(article.slug, "intro-to-x");
        assert_eq!(article.author.as_deref(), Some("Ada"));
        assert_eq!(article.category, None);
        assert!(article.is_published);
        assert!(article.published_at.is_some());

        let draft = service.create(input("Draft Y", false)).unwrap();
        assert!(draft.published_at.is_none());
    }

    #[test]
    fn test_create_validates_fields() {
        let (_file, service) = service();

        let errors = field_errors(
            service
                .create(ArticleInput {
                    title: "Hi".to_string(),
                    content: "short".to_string(),
                    ..Default::default()
                })
                .unwrap_err(),
        );
        assert!(errors.0.contains_key("title"));
        assert!(errors.0.contains_key("content"));

        let errors = field_errors(service.create(input("???", true)).unwrap_err());
        assert!(errors.0.contains_key("slug"));

        let errors = field_errors(service.create(input(&"x".repeat(300), true)).unwrap_err());
        assert_eq!(errors.0["title"], vec!["must be less than 255 characters"]);
    }

    #[test]
    fn test_create_rejects_duplicate_slug() {
        let (_file, service) = service();

        service.create(input("Same Title", true)).unwrap();
        let errors = field_errors(service.create(input("Same  title!", true)).unwrap_err());
        assert!(errors.0.contains_key("slug"));
    }

    #[test]
    fn test_publish_unpublish_toggle() {
        let (_file, service) = service();
        let draft = service.create(input("Lifecycle", false)).unwrap();

        let published = service.publish(draft.id).unwrap();
        assert!(published.is_visible());
        let stamp = published.published_at;

        // Publishing again keeps the original timestamp
        assert_eq!(service.publish(draft.id).unwrap().published_at, stamp);

        let unpublished = service.unpublish(draft.id).unwrap();
        assert!(!unpublished.is_published);
        assert!(unpublished.published_at.is_none());

        assert!(service.toggle(draft.id).unwrap().is_published);
        assert!(!service.toggle(draft.id).unwrap().is_published);
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let (_file, service) = service();
        let article = service.create(input("Removable", true)).unwrap();

        let deleted = service.soft_delete(article.id).unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(service.store.count(&ArticleFilter::visible()).unwrap(), 0);

        let restored = service.restore(article.id).unwrap();
        assert!(restored.is_visible());

        service.soft_delete(article.id).unwrap();
        service.create(input("Removable", true)).unwrap();
        let errors = field_errors(service.restore(article.id).unwrap_err());
        assert!(errors.0.contains_key("slug"));
    }

    #[test]
    fn test_write_time_slug_clash_is_validation() {
        let (_file, service) = service();
        let taken = service.create(input("Raced Title", true)).unwrap();

        // Another writer committed the slug between the check and the insert
        let err = service
            .store
            .insert(NewArticle {
                title: "Raced Title".to_string(),
                slug: taken.slug.clone(),
                content: "Second writer content.".to_string(),
                author: None,
                category: None,
                tags: None,
                published_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                is_published: false,
            })
            .unwrap_err();

        let errors = field_errors(slug_conflict(err, SLUG_TAKEN));
        assert_eq!(errors.0["slug"], vec![SLUG_TAKEN]);

        let other = slug_conflict(anyhow::anyhow!("disk gone"), SLUG_TAKEN);
        assert!(matches!(other, ArticleError::Storage(_)));
    }

    #[test]
    fn test_missing_article() {
        let (_file, service) = service();
        assert!(matches!(
            service.publish(ArticleId(99)),
            Err(ArticleError::NotFound(ArticleId(99)))
        ));
    }
}
