use super::{ApiError, ApiResult};
use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use knowbase_core::articles::ArticleInput;
use knowbase_core::query::{PaginationMeta, SearchQuery, SearchResults, DEFAULT_PER_PAGE};
use knowbase_core::text::{sanitize_input, sanitize_optional};
use knowbase_core::{Article, ArticleFilter, ArticleId};
use knowbase_mcp::GatewayError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest accepted search query, in characters
const MAX_SEARCH_QUERY_CHARS: usize = 255;

/// JSON-RPC gateway; every body gets a JSON envelope back with 200
///
/// Bodies axum refuses to buffer, such as ones over the size limit, are
/// answered as parse errors.
pub async fn mcp(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let response = match body {
        Ok(body) => state.gateway.handle_bytes(&body).await,
        Err(rejection) => state.gateway.reject_bytes(GatewayError::parse_with_detail(
            "Parse error",
            rejection.body_text(),
        )),
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        response,
    )
}

/// Article as returned by the JSON API
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            author: article.author.clone(),
            category: article.category.clone(),
            tags: article.tag_list(),
            published_at: article.published_at,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleView>,
    pub meta: PaginationMeta,
}

impl From<SearchResults> for ArticlePage {
    fn from(results: SearchResults) -> Self {
        Self {
            articles: results.articles.iter().map(ArticleView::from).collect(),
            meta: results.meta,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
}

impl ListParams {
    fn apply(self, query: SearchQuery) -> SearchQuery {
        query
            .with_category(sanitize_optional(self.category.as_deref()))
            .with_page(
                self.page.unwrap_or(1),
                self.per_page.unwrap_or(DEFAULT_PER_PAGE as i64),
            )
    }
}

/// List published articles
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ArticlePage>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let query = params.apply(SearchQuery::listing().with_filter(ArticleFilter::visible()));
    let results = state.engine.find(&query)?;

    Ok(Json(results.into()))
}

/// Search published articles by title and content
pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<ArticlePage>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let text = sanitize_input(params.q.as_deref().unwrap_or_default());
    if text.is_empty() {
        return Err(ApiError::BadRequest(
            "Search query cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_SEARCH_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at most {} characters",
            MAX_SEARCH_QUERY_CHARS
        )));
    }

    let list = ListParams {
        page: params.page,
        per_page: params.per_page,
        category: params.category,
    };
    let query = list.apply(SearchQuery::text(text).with_filter(ArticleFilter::visible()));
    let results = state.engine.find(&query)?;

    Ok(Json(results.into()))
}

/// Get a published article
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleView>> {
    let id = parse_id(&id)?;

    let article = state.articles.get(id)?;
    if !article.is_visible() {
        return Err(ApiError::NotFound(format!("Article not found: {}", id)));
    }

    Ok(Json(ArticleView::from(&article)))
}

/// Create an article
pub async fn create_article(
    State(state): State<Arc<AppState>>,
    input: Result<Json<ArticleInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ArticleView>)> {
    let Json(input) = input.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let article = state.articles.create(input)?;

    Ok((StatusCode::CREATED, Json(ArticleView::from(&article))))
}

pub async fn publish_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleView>> {
    let article = state.articles.publish(parse_id(&id)?)?;
    Ok(Json(ArticleView::from(&article)))
}

pub async fn unpublish_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleView>> {
    let article = state.articles.unpublish(parse_id(&id)?)?;
    Ok(Json(ArticleView::from(&article)))
}

pub async fn restore_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleView>> {
    let article = state.articles.restore(parse_id(&id)?)?;
    Ok(Json(ArticleView::from(&article)))
}

/// Soft-delete an article
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.articles.soft_delete(parse_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(id: &str) -> ApiResult<ArticleId> {
    id.parse()
        .map(ArticleId)
        .map_err(|_| ApiError::BadRequest(format!("Invalid article ID: {}", id)))
}
