//! Supabase/PostgREST-backed store implementation.
//!
//! Queries become `GET /rest/v1/{collection}` requests with PostgREST's
//! horizontal filtering (`column=eq.value`) and `order=` syntax. Single-row
//! lookups ask for `application/vnd.pgrst.object+json`, which makes PostgREST
//! answer `406` with code `PGRST116` when nothing matches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::warn;

use crate::application::store::{BlogStore, POSTGREST_NO_ROWS, StoreError, StoreQuery};
use crate::domain::entities::StoredBlogPost;
use crate::infra::error::InfraError;

const REST_PREFIX: &str = "rest/v1/";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Clone, Debug)]
pub struct PostgrestStore {
    client: Client,
    base: Url,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl PostgrestStore {
    pub fn new(
        base: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            base: with_trailing_slash(base),
            api_key: api_key.into(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("sanluis-blog/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self, query: &StoreQuery) -> Result<Url, StoreError> {
        let mut url = self
            .base
            .join(REST_PREFIX)
            .map_err(|err| StoreError::query("invalid_url", err.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| StoreError::query("invalid_url", "base URL cannot carry a path"))?
            .pop_if_empty()
            .push(query.collection());

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in query.filters() {
                pairs.append_pair(filter.field.column(), &format!("eq.{}", filter.value));
            }
            if !query.ordering().is_empty() {
                let order = query
                    .ordering()
                    .iter()
                    .map(|o| format!("{}.{}.nullslast", o.field.column(), o.direction.as_str()))
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.append_pair("order", &order);
            }
        }

        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await.map_err(map_reqwest_error)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl BlogStore for PostgrestStore {
    async fn execute(&self, query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError> {
        let url = self.endpoint(query)?;
        let response = self.send(self.client.get(url)).await?;
        let rows: Vec<serde_json::Value> = decode_json(response).await?;
        Ok(decode_rows(query.collection(), rows))
    }

    async fn fetch_one(&self, query: &StoreQuery) -> Result<StoredBlogPost, StoreError> {
        let url = self.endpoint(query)?;
        let response = self
            .send(self.client.get(url).header(ACCEPT, SINGLE_OBJECT))
            .await?;
        decode_json(response).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let url = self
            .base
            .join(REST_PREFIX)
            .map_err(|err| StoreError::query("invalid_url", err.to_string()))?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().is_server_error() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(StoreError::decode)
}

// A row that still fails to decode is skipped so the rest of the batch survives.
fn decode_rows(collection: &str, rows: Vec<serde_json::Value>) -> Vec<StoredBlogPost> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(post) => Some(post),
            Err(err) => {
                warn!(
                    target = "sanluis::store::decode",
                    collection,
                    index,
                    error = %err,
                    "skipping undecodable row"
                );
                None
            }
        })
        .collect()
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else if err.is_decode() {
        StoreError::decode(err)
    } else {
        StoreError::unavailable(err)
    }
}

async fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: PostgrestErrorBody = serde_json::from_str(&text).unwrap_or_default();
    classify_error(status, body, text)
}

fn classify_error(status: StatusCode, body: PostgrestErrorBody, raw: String) -> StoreError {
    if body.code.as_deref() == Some(POSTGREST_NO_ROWS) {
        return StoreError::NotFound;
    }

    let message = match (body.message, body.details) {
        (Some(message), Some(details)) => format!("{message} ({details})"),
        (Some(message), None) => message,
        (None, _) if raw.is_empty() => status.to_string(),
        (None, _) => raw,
    };

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return StoreError::Unavailable(format!("status {status}: {message}"));
    }

    let code = body.code.unwrap_or_else(|| status.as_u16().to_string());
    StoreError::Query { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::{BLOG_POSTS, Direction, PostField};

    fn store(base: &str) -> PostgrestStore {
        PostgrestStore::new(
            Url::parse(base).expect("valid url"),
            "anon-key",
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn endpoint_encodes_filters_and_order() {
        let query = StoreQuery::from_collection(BLOG_POSTS)
            .filter(PostField::Status, "published")
            .order_by(PostField::PublishedAt, Direction::Descending);

        let url = store("https://abc.supabase.co").endpoint(&query).expect("url");
        assert_eq!(url.path(), "/rest/v1/blog_posts");
        assert_eq!(
            url.query(),
            Some("select=*&status=eq.published&order=published_at.desc.nullslast")
        );
    }

    #[test]
    fn endpoint_keeps_a_base_path_prefix() {
        let query = StoreQuery::from_collection(BLOG_POSTS).filter(PostField::Slug, "a b&c");
        let url = store("http://localhost:8000/supabase").endpoint(&query).expect("url");
        assert_eq!(url.path(), "/supabase/rest/v1/blog_posts");
        assert_eq!(url.query(), Some("select=*&slug=eq.a+b%26c"));
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let rows = vec![
            serde_json::json!({"id": 1, "slug": "kept", "published_at": "2024-10-01T10:00:00"}),
            serde_json::json!({"id": 2, "title": "no slug"}),
            serde_json::json!({"id": 3, "slug": "also-kept", "tags": ["a", null]}),
        ];

        let slugs: Vec<_> = decode_rows(BLOG_POSTS, rows)
            .into_iter()
            .map(|row| row.slug)
            .collect();
        assert_eq!(slugs, ["kept", "also-kept"]);
    }

    #[test]
    fn no_rows_code_is_not_found() {
        let body = PostgrestErrorBody {
            code: Some("PGRST116".into()),
            message: Some("JSON object requested, multiple (or no) rows returned".into()),
            details: Some("The result contains 0 rows".into()),
        };
        assert_eq!(
            classify_error(StatusCode::NOT_ACCEPTABLE, body, String::new()),
            StoreError::NotFound
        );
    }

    #[test]
    fn server_errors_are_unavailable() {
        let err = classify_error(
            StatusCode::BAD_GATEWAY,
            PostgrestErrorBody::default(),
            "upstream down".into(),
        );
        assert_eq!(err.kind(), "unavailable");
    }

    #[test]
    fn rejected_queries_keep_the_postgres_code() {
        let body = PostgrestErrorBody {
            code: Some("42P01".into()),
            message: Some("relation \"public.blog_posts\" does not exist".into()),
            details: None,
        };
        match classify_error(StatusCode::NOT_FOUND, body, String::new()) {
            StoreError::Query { code, message } => {
                assert_eq!(code, "42P01");
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
