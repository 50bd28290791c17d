use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::store::{BlogStore, Direction, PostField, StoreError, StoreQuery};
use crate::domain::entities::StoredBlogPost;

use super::PostgresStore;
use super::types::BlogPostRow;
use crate::infra::db::map_sqlx_error;

// Casts keep the row shape stable whether ids are uuid or bigint, statuses
// are an enum or text, and timestamps carry a zone or not.
const SELECT_COLUMNS: &str = "SELECT id::text AS id, slug, title, title_en, content, content_en, \
     excerpt, excerpt_en, image_url, category, tags, status::text AS status, \
     published_at::timestamptz AS published_at, created_at::timestamptz AS created_at FROM ";

fn filter_expr(field: PostField) -> &'static str {
    match field {
        PostField::Slug => "slug",
        PostField::Status => "status::text",
        PostField::PublishedAt => "published_at::text",
    }
}

fn sql_direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
    }
}

fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

fn build_select(query: &StoreQuery) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_COLUMNS);
    qb.push(quote_ident(query.collection()));
    qb.push(" WHERE 1=1");

    for filter in query.filters() {
        qb.push(" AND ");
        qb.push(filter_expr(filter.field));
        qb.push(" = ");
        qb.push_bind(filter.value.as_str());
    }

    if !query.ordering().is_empty() {
        qb.push(" ORDER BY ");
        let mut columns = qb.separated(", ");
        for order in query.ordering() {
            columns.push(format!(
                "{} {} NULLS LAST",
                order.field.column(),
                sql_direction(order.direction)
            ));
        }
    }

    qb
}

#[async_trait]
impl BlogStore for PostgresStore {
    async fn execute(&self, query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError> {
        let mut qb = build_select(query);
        let rows = qb
            .build_query_as::<BlogPostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(StoredBlogPost::from).collect())
    }

    async fn fetch_one(&self, query: &StoreQuery) -> Result<StoredBlogPost, StoreError> {
        let mut qb = build_select(query);
        qb.push(" LIMIT 1");
        let row = qb
            .build_query_as::<BlogPostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(StoredBlogPost::from).ok_or(StoreError::NotFound)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::BLOG_POSTS;

    #[test]
    fn published_listing_sql() {
        let query = StoreQuery::from_collection(BLOG_POSTS)
            .filter(PostField::Status, "published")
            .order_by(PostField::PublishedAt, Direction::Descending);

        let qb = build_select(&query);
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT id::text AS id, slug, title"));
        assert!(sql.ends_with(
            "FROM \"blog_posts\" WHERE 1=1 AND status::text = $1 \
             ORDER BY published_at DESC NULLS LAST"
        ));
    }

    #[test]
    fn slug_lookup_binds_the_slug() {
        let query = StoreQuery::from_collection(BLOG_POSTS).filter(PostField::Slug, "x'; drop");
        let qb = build_select(&query);
        assert!(qb.sql().ends_with("WHERE 1=1 AND slug = $1"));
        assert!(!qb.sql().contains("drop"));
    }

    #[test]
    fn every_field_is_a_selected_column() {
        for field in [PostField::Slug, PostField::Status, PostField::PublishedAt] {
            assert!(SELECT_COLUMNS.contains(field.column()), "{field:?}");
            assert!(filter_expr(field).starts_with(field.column()), "{field:?}");
        }
    }

    #[test]
    fn schema_qualified_collections_are_quoted_per_part() {
        assert_eq!(quote_ident("public.blog_posts"), "\"public\".\"blog_posts\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
