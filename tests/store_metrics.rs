use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use sanluis_blog::application::blog::{BlogService, METRIC_POSTS_SERVED, METRIC_STORE_ERRORS};
use sanluis_blog::application::store::{BlogStore, StoreError, StoreQuery};
use sanluis_blog::domain::entities::StoredBlogPost;
use sanluis_blog::domain::types::PostStatus;

/// Lists succeed, lookups time out.
struct HalfBrokenStore;

#[async_trait]
impl BlogStore for HalfBrokenStore {
    async fn execute(&self, _query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError> {
        Ok(vec![StoredBlogPost {
            id: "1".into(),
            slug: "a".into(),
            title: None,
            title_en: None,
            content: None,
            content_en: None,
            excerpt: None,
            excerpt_en: None,
            image_url: None,
            category: None,
            tags: None,
            status: Some(PostStatus::Published),
            published_at: None,
            created_at: None,
        }])
    }

    async fn fetch_one(&self, query: &StoreQuery) -> Result<StoredBlogPost, StoreError> {
        match query.filters().first().map(|filter| filter.value.as_str()) {
            Some("missing") => Err(StoreError::NotFound),
            _ => Err(StoreError::Timeout),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn store_failures_are_counted_by_operation_and_kind() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let blog = BlogService::new(Arc::new(HalfBrokenStore));
    assert_eq!(blog.list_published().await.len(), 1);
    assert!(blog.get_by_slug("slow").await.is_none());
    assert!(blog.get_by_slug("slow").await.is_none());
    assert!(blog.get_by_slug("missing").await.is_none());

    let counters: HashMap<(String, Vec<(String, String)>), u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| {
            let key = composite_key.key();
            let mut labels: Vec<_> = key
                .labels()
                .map(|label| (label.key().to_string(), label.value().to_string()))
                .collect();
            labels.sort();
            match value {
                DebugValue::Counter(count) => Some(((key.name().to_string(), labels), count)),
                _ => None,
            }
        })
        .collect();

    let label = |pairs: &[(&str, &str)]| -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };

    assert_eq!(
        counters.get(&(
            METRIC_STORE_ERRORS.to_string(),
            label(&[("kind", "timeout"), ("operation", "get_by_slug")])
        )),
        Some(&2)
    );
    assert_eq!(
        counters.get(&(
            METRIC_POSTS_SERVED.to_string(),
            label(&[("operation", "list_published")])
        )),
        Some(&1)
    );
    assert!(
        !counters
            .keys()
            .any(|(name, labels)| name == METRIC_STORE_ERRORS
                && labels.contains(&("kind".to_string(), "not_found".to_string()))),
        "absence is not a store error"
    );
}
