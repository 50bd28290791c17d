use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use sanluis_blog::application::blog::BlogService;
use sanluis_blog::application::store::{BlogStore, StoreError, StoreQuery};
use sanluis_blog::domain::entities::StoredBlogPost;
use sanluis_blog::domain::types::PostStatus;
use sanluis_blog::infra::http::{HttpState, build_router};
use serde_json::Value;
use time::macros::datetime;
use tower::ServiceExt;

struct TableStore {
    rows: Vec<StoredBlogPost>,
}

#[async_trait]
impl BlogStore for TableStore {
    async fn execute(&self, query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError> {
        Ok(query.apply(self.rows.clone()))
    }

    async fn fetch_one(&self, query: &StoreQuery) -> Result<StoredBlogPost, StoreError> {
        query
            .apply(self.rows.clone())
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct DownStore;

#[async_trait]
impl BlogStore for DownStore {
    async fn execute(&self, _query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError> {
        Err(StoreError::Timeout)
    }

    async fn fetch_one(&self, _query: &StoreQuery) -> Result<StoredBlogPost, StoreError> {
        Err(StoreError::Timeout)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

fn sample_rows() -> Vec<StoredBlogPost> {
    vec![
        StoredBlogPost {
            id: "1".into(),
            slug: "jardin-de-san-francisco".into(),
            title: Some("Jardín de San Francisco".into()),
            title_en: Some("San Francisco Garden".into()),
            content: Some("Contenido".into()),
            content_en: None,
            excerpt: Some("Resumen".into()),
            excerpt_en: Some("Summary".into()),
            image_url: Some("https://cdn.example/jardin.jpg".into()),
            category: Some("lugares".into()),
            tags: Some(vec!["centro".into()]),
            status: Some(PostStatus::Published),
            published_at: Some(datetime!(2024-03-01 12:00 UTC)),
            created_at: Some(datetime!(2024-02-28 09:00 UTC)),
        },
        StoredBlogPost {
            id: "2".into(),
            slug: "borrador".into(),
            title: Some("Borrador".into()),
            title_en: None,
            content: None,
            content_en: None,
            excerpt: None,
            excerpt_en: None,
            image_url: None,
            category: None,
            tags: None,
            status: Some(PostStatus::Draft),
            published_at: None,
            created_at: None,
        },
    ]
}

fn app(store: Arc<dyn BlogStore>) -> Router {
    build_router(HttpState::new(BlogService::new(store)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn list_returns_published_posts_in_public_shape() {
    let (status, body) = get(
        app(Arc::new(TableStore {
            rows: sample_rows(),
        })),
        "/api/blog/posts",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let posts = json(&body);
    let posts = posts.as_array().expect("array");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "jardin-de-san-francisco");
    assert_eq!(posts[0]["titleEn"], "San Francisco Garden");
    assert_eq!(posts[0]["imageUrl"], "https://cdn.example/jardin.jpg");
    assert_eq!(posts[0]["publishedAt"], "2024-03-01T12:00:00Z");
}

#[tokio::test]
async fn list_with_locale_collapses_language_variants() {
    let (status, body) = get(
        app(Arc::new(TableStore {
            rows: sample_rows(),
        })),
        "/api/blog/posts?locale=en",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let posts = json(&body);
    assert_eq!(posts[0]["locale"], "en");
    assert_eq!(posts[0]["title"], "San Francisco Garden");
    assert_eq!(posts[0]["content"], "Contenido");
    assert_eq!(posts[0]["excerpt"], "Summary");
    assert!(posts[0].get("titleEn").is_none());
}

#[tokio::test]
async fn detail_returns_any_status_by_slug() {
    let (status, body) = get(
        app(Arc::new(TableStore {
            rows: sample_rows(),
        })),
        "/api/blog/posts/borrador",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let post = json(&body);
    assert_eq!(post["status"], "draft");
    assert_eq!(post["tags"], serde_json::json!([]));
    assert_eq!(post["content"], "");
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let (status, _) = get(
        app(Arc::new(TableStore {
            rows: sample_rows(),
        })),
        "/api/blog/posts/no-existe",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_locale_is_a_bad_request() {
    let (status, _) = get(
        app(Arc::new(TableStore {
            rows: sample_rows(),
        })),
        "/api/blog/posts?locale=fr",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_outage_keeps_the_public_contract() {
    let (status, body) = get(app(Arc::new(DownStore)), "/api/blog/posts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));

    let (status, _) = get(app(Arc::new(DownStore)), "/api/blog/posts/any").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reflects_store_reachability() {
    let (status, _) = get(
        app(Arc::new(TableStore {
            rows: Vec::new(),
        })),
        "/health",
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(app(Arc::new(DownStore)), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
