use crate::types::{Article, ArticleFilter, ArticleId, ArticleOrder, NewArticle};
use anyhow::{bail, Context, Result};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::PathBuf;
use std::sync::Arc;

const ARTICLES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("articles");
// slug -> id, only for articles that are not soft-deleted
const SLUGS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("article_slugs");

/// A write would give a second live article the same slug
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Slug already in use: {0}")]
pub struct SlugInUse(pub String);

/// Article store backed by redb
#[derive(Clone)]
pub struct RedbArticleStore {
    db: Arc<Database>,
}

impl RedbArticleStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create store directory")?;
        }

        let db = Database::create(&path).context("Failed to create redb database")?;

        // Initialize tables
        let write_txn = db.begin_write().context("Failed to begin write transaction")?;
        {
            let _articles_table = write_txn
                .open_table(ARTICLES_TABLE)
                .context("Failed to open articles table")?;
            let _slugs_table = write_txn
                .open_table(SLUGS_TABLE)
                .context("Failed to open slugs table")?;
        }
        write_txn.commit().context("Failed to commit transaction")?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Store a new article under the next free identifier
    pub fn insert(&self, new: NewArticle) -> Result<Article> {
        let write_txn = self.db.begin_write().context("Failed to begin write")?;
        let article = {
            let mut articles = write_txn
                .open_table(ARTICLES_TABLE)
                .context("Failed to open table")?;
            let mut slugs = write_txn
                .open_table(SLUGS_TABLE)
                .context("Failed to open table")?;

            if slugs
                .get(new.slug.as_str())
                .context("Failed to look up slug")?
                .is_some()
            {
                return Err(SlugInUse(new.slug).into());
            }

            let next_id = match articles.last().context("Failed to read last article")? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };

            let article = new.into_article(ArticleId(next_id));
            let value = serde_json::to_vec(&article).context("Failed to serialize article")?;

            articles
                .insert(next_id, value.as_slice())
                .context("Failed to insert article")?;
            slugs
                .insert(article.slug.as_str(), next_id)
                .context("Failed to index slug")?;

            article
        };
        write_txn.commit().context("Failed to commit")?;

        tracing::debug!(id = %article.id, slug = %article.slug, "Stored article");
        Ok(article)
    }

    /// Replace a stored article, keeping the slug index in step with `deleted_at`
    pub fn update(&self, article: &Article) -> Result<()> {
        let write_txn = self.db.begin_write().context("Failed to begin write")?;
        {
            let mut articles = write_txn
                .open_table(ARTICLES_TABLE)
                .context("Failed to open table")?;
            let mut slugs = write_txn
                .open_table(SLUGS_TABLE)
                .context("Failed to open table")?;

            let id = article.id.0;
            let previous: Article = match articles.get(id).context("Failed to get article")? {
                Some(guard) => serde_json::from_slice(guard.value())
                    .context("Failed to deserialize article")?,
                None => bail!("Article not found: {}", article.id),
            };

            let owner = slugs
                .get(previous.slug.as_str())
                .context("Failed to look up slug")?
                .map(|guard| guard.value());
            if owner == Some(id) && (previous.slug != article.slug || article.is_deleted()) {
                slugs
                    .remove(previous.slug.as_str())
                    .context("Failed to release slug")?;
            }

            if !article.is_deleted() {
                let owner = slugs
                    .get(article.slug.as_str())
                    .context("Failed to look up slug")?
                    .map(|guard| guard.value());
                match owner {
                    Some(other) if other != id => {
                        return Err(SlugInUse(article.slug.clone()).into())
                    }
                    Some(_) => {}
                    None => {
                        slugs
                            .insert(article.slug.as_str(), id)
                            .context("Failed to index slug")?;
                    }
                }
            }

            let value = serde_json::to_vec(article).context("Failed to serialize article")?;
            articles
                .insert(id, value.as_slice())
                .context("Failed to update article")?;
        }
        write_txn.commit().context("Failed to commit")?;
        Ok(())
    }

    /// Get an article by ID, deleted or not
    pub fn get(&self, id: ArticleId) -> Result<Option<Article>> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn
            .open_table(ARTICLES_TABLE)
            .context("Failed to open table")?;

        let value = table.get(id.0).context("Failed to get article")?;

        match value {
            Some(guard) => {
                let article: Article = serde_json::from_slice(guard.value())
                    .context("Failed to deserialize article")?;
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }

    /// Get the non-deleted article that owns a slug
    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let id = {
            let read_txn = self.db.begin_read().context("Failed to begin read")?;
            let table = read_txn
                .open_table(SLUGS_TABLE)
                .context("Failed to open table")?;
            let value = table.get(slug).context("Failed to look up slug")?;
            value.map(|guard| guard.value())
        };

        match id {
            Some(id) => Ok(self
                .get(ArticleId(id))?
                .filter(|article| !article.is_deleted())),
            None => Ok(None),
        }
    }

    /// List articles matching a filter in the requested order
    pub fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn
            .open_table(ARTICLES_TABLE)
            .context("Failed to open table")?;

        let mut articles = Vec::new();
        for item in table.iter().context("Failed to iterate articles")? {
            let (_key, value) = item.context("Failed to read item")?;
            let article: Article = serde_json::from_slice(value.value())
                .context("Failed to deserialize article")?;
            if filter.matches(&article) {
                articles.push(article);
            }
        }

        order.sort(&mut articles);
        Ok(articles)
    }

    /// Count articles matching a filter
    pub fn count(&self, filter: &ArticleFilter) -> Result<usize> {
        let read_txn = self.db.begin_read().context("Failed to begin read")?;
        let table = read_txn
            .open_table(ARTICLES_TABLE)
            .context("Failed to open table")?;

        let mut count = 0;
        for item in table.iter().context("Failed to iterate articles")? {
            let (_key, value) = item.context("Failed to read item")?;
            let article: Article = serde_json::from_slice(value.value())
                .context("Failed to deserialize article")?;
            if filter.matches(&article) {
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Read contract for article storage
pub trait ArticleStore: Send + Sync {
    /// List articles matching a filter
    fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>>;

    /// Get an article by ID
    fn get(&self, id: ArticleId) -> Result<Option<Article>>;

    /// Get the non-deleted article with a slug
    fn find_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Count articles matching a filter
    fn count(&self, filter: &ArticleFilter) -> Result<usize>;
}

impl ArticleStore for RedbArticleStore {
    fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>> {
        RedbArticleStore::list(self, filter, order)
    }

    fn get(&self, id: ArticleId) -> Result<Option<Article>> {
        RedbArticleStore::get(self, id)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        RedbArticleStore::find_by_slug(self, slug)
    }

    fn count(&self, filter: &ArticleFilter) -> Result<usize> {
        RedbArticleStore::count(self, filter)
    }
}
