//! Mapping from stored rows to the public post shape.
//!
//! Normalization is total: any row the store returns maps to exactly one
//! [`BlogPost`]. Missing text becomes an empty string, missing tags an empty
//! list, and an absent status is reported as [`PostStatus::Unknown`].

use crate::domain::entities::StoredBlogPost;
use crate::domain::types::{BlogPost, PostStatus};

pub fn normalize(record: StoredBlogPost) -> BlogPost {
    BlogPost {
        id: record.id,
        slug: record.slug,
        title: record.title.unwrap_or_default(),
        title_en: record.title_en,
        content: record.content.unwrap_or_default(),
        content_en: record.content_en,
        excerpt: record.excerpt.unwrap_or_default(),
        excerpt_en: record.excerpt_en,
        image_url: record.image_url,
        category: record.category.unwrap_or_default(),
        tags: record.tags.unwrap_or_default(),
        status: record.status.unwrap_or(PostStatus::Unknown),
        published_at: record.published_at,
        created_at: record.created_at,
    }
}

/// Normalize a batch, preserving store order.
pub fn normalize_all(records: Vec<StoredBlogPost>) -> Vec<BlogPost> {
    records.into_iter().map(normalize).collect()
}

impl From<StoredBlogPost> for BlogPost {
    fn from(record: StoredBlogPost) -> Self {
        normalize(record)
    }
}
