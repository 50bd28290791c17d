//! JSON surface over the blog service.

mod middleware;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::Span;

use crate::application::{blog::BlogService, error::HttpError};
use crate::domain::types::{BlogPost, Locale};

use middleware::trace_requests;

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
}

impl HttpState {
    pub fn new(blog: BlogService) -> Self {
        Self {
            blog: Arc::new(blog),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/blog/posts", get(list_posts))
        .route("/api/blog/posts/{slug}", get(post_detail))
        .route("/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(trace_requests))
}

#[derive(Debug, Default, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

impl LocaleQuery {
    fn resolve(&self) -> Result<Option<Locale>, HttpError> {
        match self.locale.as_deref() {
            None => Ok(None),
            Some(raw) => {
                Span::current().record("locale", raw);
                raw.parse::<Locale>().map(Some).map_err(|err| {
                    HttpError::from_error(
                        "infra::http::locale_query",
                        StatusCode::BAD_REQUEST,
                        "Invalid locale",
                        &err,
                    )
                })
            }
        }
    }
}

async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<LocaleQuery>,
) -> Result<Response, HttpError> {
    let locale = query.resolve()?;
    let posts = state.blog.list_published().await;

    Ok(match locale {
        Some(locale) => Json(
            posts
                .into_iter()
                .map(|post| post.into_localized(locale))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        None => Json(posts).into_response(),
    })
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Response, HttpError> {
    Span::current().record("slug", slug.as_str());
    let locale = query.resolve()?;
    let post: BlogPost = state.blog.get_by_slug(&slug).await.ok_or_else(|| {
        HttpError::new(
            "infra::http::post_detail",
            StatusCode::NOT_FOUND,
            "Post not found",
            format!("no post with slug `{slug}`"),
        )
    })?;

    Ok(match locale {
        Some(locale) => Json(post.into_localized(locale)).into_response(),
        None => Json(post).into_response(),
    })
}

async fn health(State(state): State<HttpState>) -> Result<StatusCode, HttpError> {
    state.blog.health_check().await?;
    Ok(StatusCode::NO_CONTENT)
}
