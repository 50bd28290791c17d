//! Store abstraction consumed by the blog service.
//!
//! Queries are plain values built with [`StoreQuery`]; adapters translate them
//! into PostgREST requests or SQL. Test doubles implement [`BlogStore`] and can
//! evaluate a query in memory with [`StoreQuery::apply`].

use std::cmp::Ordering;

use async_trait::async_trait;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;

use crate::domain::entities::StoredBlogPost;

pub const BLOG_POSTS: &str = "blog_posts";

/// PostgREST reports "zero (or many) rows for a single-object request" with this code.
pub const POSTGREST_NO_ROWS: &str = "PGRST116";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no matching row")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store request timed out")]
    Timeout,
    #[error("query rejected ({code}): {message}")]
    Query { code: String, message: String },
    #[error("malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound => "not_found",
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout => "timeout",
            StoreError::Query { .. } => "query",
            StoreError::Decode(_) => "decode",
        }
    }
}

/// Columns a query may filter or order on. Only columns some query needs are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Slug,
    Status,
    PublishedAt,
}

impl PostField {
    pub fn column(self) -> &'static str {
        match self {
            PostField::Slug => "slug",
            PostField::Status => "status",
            PostField::PublishedAt => "published_at",
        }
    }

    fn text_of(self, record: &StoredBlogPost) -> Option<String> {
        match self {
            PostField::Slug => Some(record.slug.clone()),
            PostField::Status => record.status.map(|status| status.as_str().to_string()),
            PostField::PublishedAt => record.published_at.and_then(|ts| ts.format(&Rfc3339).ok()),
        }
    }

    fn compare(self, left: &StoredBlogPost, right: &StoredBlogPost) -> Option<Ordering> {
        let ordering = match self {
            PostField::PublishedAt => compare_present(left.published_at, right.published_at)?,
            other => compare_present(other.text_of(left), other.text_of(right))?,
        };
        Some(ordering)
    }
}

// `None` when either side is missing; the caller decides where missing values go.
fn compare_present<T: Ord>(left: Option<T>, right: Option<T>) -> Option<Ordering> {
    Some(left?.cmp(&right?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: PostField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: PostField,
    pub direction: Direction,
}

/// Equality filters plus ordering over one collection.
///
/// Rows missing the ordering column always sort last, whatever the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    collection: String,
    filters: Vec<Filter>,
    ordering: Vec<OrderBy>,
}

impl StoreQuery {
    pub fn from_collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            ordering: Vec::new(),
        }
    }

    pub fn filter(mut self, field: PostField, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            field,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: PostField, direction: Direction) -> Self {
        self.ordering.push(OrderBy { field, direction });
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.ordering
    }

    pub fn matches(&self, record: &StoredBlogPost) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.field.text_of(record).as_deref() == Some(filter.value.as_str()))
    }

    /// Evaluate the query against in-memory rows with adapter semantics.
    pub fn apply<I>(&self, rows: I) -> Vec<StoredBlogPost>
    where
        I: IntoIterator<Item = StoredBlogPost>,
    {
        let mut selected: Vec<_> = rows.into_iter().filter(|row| self.matches(row)).collect();
        selected.sort_by(|left, right| self.compare(left, right));
        selected
    }

    fn compare(&self, left: &StoredBlogPost, right: &StoredBlogPost) -> Ordering {
        for order in &self.ordering {
            let field = order.field;
            let ordering = match field.compare(left, right) {
                Some(ordering) => match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                },
                None => {
                    let left_missing = field.text_of(left).is_none();
                    let right_missing = field.text_of(right).is_none();
                    left_missing.cmp(&right_missing)
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Read-only capability over the `blog_posts` collection.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Run the query and return every matching row in query order.
    async fn execute(&self, query: &StoreQuery) -> Result<Vec<StoredBlogPost>, StoreError>;

    /// Fetch exactly one row; zero rows is [`StoreError::NotFound`].
    async fn fetch_one(&self, query: &StoreQuery) -> Result<StoredBlogPost, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
