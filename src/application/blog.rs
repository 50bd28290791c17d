use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::store::{
    BLOG_POSTS, BlogStore, Direction, PostField, StoreError, StoreQuery,
};
use crate::domain::blog::{normalize, normalize_all};
use crate::domain::types::{BlogPost, PostStatus};

pub const METRIC_STORE_ERRORS: &str = "sanluis_blog_store_errors_total";
pub const METRIC_POSTS_SERVED: &str = "sanluis_blog_posts_served_total";

const OP_LIST_PUBLISHED: &str = "list_published";
const OP_GET_BY_SLUG: &str = "get_by_slug";

/// Read side of the blog: published listings and slug lookups.
///
/// `list_published` and `get_by_slug` never fail; store errors degrade to an
/// empty list or `None`. Hosts that need to tell "absent" from "store down"
/// use the `try_` variants.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn BlogStore>,
    collection: String,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self {
            store,
            collection: BLOG_POSTS.to_string(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn published_query(&self) -> StoreQuery {
        StoreQuery::from_collection(self.collection.as_str())
            .filter(PostField::Status, PostStatus::Published.as_str())
            .order_by(PostField::PublishedAt, Direction::Descending)
    }

    pub fn slug_query(&self, slug: &str) -> StoreQuery {
        StoreQuery::from_collection(self.collection.as_str()).filter(PostField::Slug, slug)
    }

    pub async fn try_list_published(&self) -> Result<Vec<BlogPost>, StoreError> {
        let rows = self.store.execute(&self.published_query()).await?;
        Ok(normalize_all(rows))
    }

    pub async fn try_get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        match self.store.fetch_one(&self.slug_query(slug)).await {
            Ok(row) => Ok(Some(normalize(row))),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn list_published(&self) -> Vec<BlogPost> {
        match self.try_list_published().await {
            Ok(posts) => {
                counter!(METRIC_POSTS_SERVED, "operation" => OP_LIST_PUBLISHED)
                    .increment(posts.len() as u64);
                posts
            }
            Err(err) => {
                record_store_error(OP_LIST_PUBLISHED, &err);
                warn!(
                    target = "sanluis::blog",
                    operation = OP_LIST_PUBLISHED,
                    kind = err.kind(),
                    error = %err,
                    "listing published posts failed; serving an empty list"
                );
                Vec::new()
            }
        }
    }

    pub async fn get_by_slug(&self, slug: &str) -> Option<BlogPost> {
        match self.try_get_by_slug(slug).await {
            Ok(Some(post)) => {
                counter!(METRIC_POSTS_SERVED, "operation" => OP_GET_BY_SLUG).increment(1);
                Some(post)
            }
            Ok(None) => {
                debug!(target = "sanluis::blog", slug, "no post matches slug");
                None
            }
            Err(err) => {
                record_store_error(OP_GET_BY_SLUG, &err);
                warn!(
                    target = "sanluis::blog",
                    operation = OP_GET_BY_SLUG,
                    slug,
                    kind = err.kind(),
                    error = %err,
                    "post lookup failed; treating as absent"
                );
                None
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }
}

fn record_store_error(operation: &'static str, err: &StoreError) {
    counter!(METRIC_STORE_ERRORS, "operation" => operation, "kind" => err.kind()).increment(1);
}
