use crate::config::{AppState, ServerConfig};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use knowbase_core::articles::{ArticleError, ValidationErrors};
use knowbase_core::storage::ArticleStore;
use knowbase_core::ArticleFilter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(addr: &str, config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        // MCP gateway
        .route("/mcp", post(handlers::mcp))
        // Article API
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/api/articles/{id}",
            get(handlers::get_article).delete(handlers::delete_article),
        )
        .route("/api/articles/{id}/publish", post(handlers::publish_article))
        .route("/api/articles/{id}/unpublish", post(handlers::unpublish_article))
        .route("/api/articles/{id}/restore", post(handlers::restore_article))
        .route("/api/search", get(handlers::search_articles))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

/// Service index
async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "knowbase",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /api/health",
            "mcp": "POST /mcp",
            "articles": "GET /api/articles",
            "article": "GET /api/articles/{id}",
            "search": "GET /api/search?q=",
            "create": "POST /api/articles",
        },
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let articles = ArticleStore::count(state.store.as_ref(), &ArticleFilter::visible())?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": "knowbase",
        "version": env!("CARGO_PKG_VERSION"),
        "articles": articles,
    })))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<ValidationErrors>,
}

/// Error type for API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "article_not_found",
            Self::BadRequest(_) => "invalid_request",
            Self::Validation(_) => "validation_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<ArticleError> for ApiError {
    fn from(err: ArticleError) -> Self {
        match err {
            ArticleError::NotFound(id) => Self::NotFound(format!("Article not found: {}", id)),
            ArticleError::Validation(errors) => Self::Validation(errors),
            ArticleError::Storage(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.kind().to_string();

        let response = match self {
            Self::Validation(errors) => ErrorResponse {
                error,
                message: "Validation failed".to_string(),
                validation_errors: Some(errors),
            },
            Self::Internal(e) => {
                tracing::error!("API internal error: {:#}", e);
                ErrorResponse {
                    error,
                    message: "An unexpected error occurred".to_string(),
                    validation_errors: None,
                }
            }
            other => ErrorResponse {
                error,
                message: other.to_string(),
                validation_errors: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use knowbase_core::storage::RedbArticleStore;
    use knowbase_mcp::GatewayConfig;
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    struct TestApp {
        _file: NamedTempFile,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let file = NamedTempFile::new().unwrap();
            let store = Arc::new(RedbArticleStore::new(file.path().to_path_buf()).unwrap());
            let state = AppState::from_store(store, &GatewayConfig::default());
            Self {
                _file: file,
                router: create_router(state),
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::post(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn create(&self, title: &str, content: &str, published: bool) -> u64 {
            let (status, body) = self
                .post_json(
                    "/api/articles",
                    json!({
                        "title": title,
                        "content": content,
                        "category": "guides",
                        "tags": "rust, web",
                        "is_published": published
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            body["id"].as_u64().unwrap()
        }
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let app = TestApp::new();
        app.create("Visible One", "Published content here.", true).await;
        app.create("Hidden One", "Draft content here.", false).await;

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "knowbase");

        let (status, body) = app.get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["articles"], 1);
    }

    #[tokio::test]
    async fn test_create_and_fetch_article() {
        let app = TestApp::new();
        let id = app
            .create("Getting Started", "<p>Install</p> everything first.", true)
            .await;

        let (status, body) = app.get(&format!("/api/articles/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "getting-started");
        assert_eq!(body["content"], "Install everything first.");
        assert_eq!(body["tags"], json!(["rust", "web"]));
        assert!(body["published_at"].is_string());
        assert!(body.get("deleted_at").is_none());
    }

    #[tokio::test]
    async fn test_create_reports_validation_errors() {
        let app = TestApp::new();

        let (status, body) = app
            .post_json("/api/articles", json!({"title": "Hi", "content": "short"}))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert!(body["validation_errors"]["title"].is_array());
        assert!(body["validation_errors"]["content"].is_array());

        app.create("Unique Title", "Some valid content.", true).await;
        let (status, body) = app
            .post_json(
                "/api/articles",
                json!({"title": "Unique Title", "content": "Some other content."}),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["validation_errors"]["slug"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_create_body_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Request::post("/api/articles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_until_published() {
        let app = TestApp::new();
        let id = app.create("Secret Plan", "Not for public eyes.", false).await;

        let (status, body) = app.get(&format!("/api/articles/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "article_not_found");

        let (status, body) = app.post_empty(&format!("/api/articles/{}/publish", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["published_at"].is_string());

        let (status, _) = app.get(&format!("/api/articles/{}", id)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.post_empty(&format!("/api/articles/{}/unpublish", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["published_at"], Value::Null);
    }

    #[tokio::test]
    async fn test_delete_and_restore() {
        let app = TestApp::new();
        let id = app.create("Short Lived", "Here today, gone tomorrow.", true).await;

        let (status, body) = app
            .send(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/articles/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = app.get(&format!("/api/articles/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.post_empty(&format!("/api/articles/{}/restore", id)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get(&format!("/api/articles/{}", id)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.post_empty("/api/articles/999/publish").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_paginates_visible_articles() {
        let app = TestApp::new();
        for title in ["Alpha Post", "Beta Post", "Gamma Post"] {
            app.create(title, "Content for the listing.", true).await;
        }
        app.create("Delta Draft", "Content for the listing.", false).await;

        let (status, body) = app.get("/api/articles?page=2&per_page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["meta"],
            json!({"total": 3, "page": 2, "per_page": 2, "total_pages": 2})
        );
        let articles = body["articles"].as_array().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0]["title"], "Alpha Post");

        let (_, body) = app.get("/api/articles?category=other").await;
        assert_eq!(body["meta"]["total"], 0);
        assert_eq!(body["meta"]["total_pages"], 0);

        let (status, body) = app.get("/api/articles?page=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let app = TestApp::new();
        app.create("Rust Ownership", "Borrowing explained in depth.", true).await;
        app.create("Python Basics", "Indentation matters here.", true).await;

        let (status, body) = app.get("/api/search?q=rust").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["articles"][0]["slug"], "rust-ownership");

        for uri in ["/api/search", "/api/search?q=", "/api/search?q=%3Cb%3E%3C%2Fb%3E"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "invalid_request");
        }

        let long = "a".repeat(256);
        let (status, _) = app.get(&format!("/api/search?q={}", long)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mcp_endpoint_always_answers_json() {
        let app = TestApp::new();
        app.create("Intro", "Welcome to the knowledge base.", true).await;

        let response = app
            .router
            .clone()
            .oneshot(Request::post("/mcp").body(Body::from("garbage")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], -32700);

        let (status, body) = app
            .post_json(
                "/mcp",
                json!({"jsonrpc": "2.0", "id": "r1", "method": "resources/list"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "r1");
        assert_eq!(body["result"]["resources"][0]["uri"], "kb://article/intro");
    }

    #[tokio::test]
    async fn test_mcp_oversized_body_is_parse_error() {
        let app = TestApp::new();

        // Well past axum's default 2 MB buffering limit
        let padding = "x".repeat(3 * 1024 * 1024);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/list",
            "params": {"padding": padding}
        });

        let response = app
            .router
            .clone()
            .oneshot(
                Request::post("/mcp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32700);
        assert!(body.get("result").is_none());
    }
}
