use time::OffsetDateTime;

use crate::domain::entities::{StoredBlogPost, compact_tags};
use crate::domain::types::PostStatus;

#[derive(sqlx::FromRow)]
pub(crate) struct BlogPostRow {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: Option<String>,
    pub(crate) title_en: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) content_en: Option<String>,
    pub(crate) excerpt: Option<String>,
    pub(crate) excerpt_en: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) tags: Option<Vec<Option<String>>>,
    pub(crate) status: Option<String>,
    pub(crate) published_at: Option<OffsetDateTime>,
    pub(crate) created_at: Option<OffsetDateTime>,
}

impl From<BlogPostRow> for StoredBlogPost {
    fn from(row: BlogPostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            title_en: row.title_en,
            content: row.content,
            content_en: row.content_en,
            excerpt: row.excerpt,
            excerpt_en: row.excerpt_en,
            image_url: row.image_url,
            category: row.category,
            tags: compact_tags(row.tags),
            status: row.status.as_deref().map(PostStatus::from_db),
            published_at: row.published_at,
            created_at: row.created_at,
        }
    }
}
