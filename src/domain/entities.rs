//! Domain entities mirrored from persistent storage.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};
use time::{
    OffsetDateTime, PrimitiveDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};
use tracing::warn;

use crate::domain::types::PostStatus;

/// A `blog_posts` row exactly as the store hands it over.
///
/// Every column that the store allows to be `NULL` is optional here, so that
/// decoding never rejects a row the store accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlogPost {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_en: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub excerpt_en: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "tags_without_nulls")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "status_from_text")]
    pub status: Option<PostStatus>,
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "lenient_timestamp"
    )]
    pub published_at: Option<OffsetDateTime>,
    #[serde(
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// Drop `NULL` elements of a text array column.
pub fn compact_tags(tags: Option<Vec<Option<String>>>) -> Option<Vec<String>> {
    tags.map(|tags| tags.into_iter().flatten().collect())
}

/// Parse a timestamp column as PostgREST renders it.
///
/// `timestamptz` arrives as RFC 3339; `timestamp` arrives without an offset
/// and is read as UTC. Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    let naive = raw.replacen(' ', "T", 1);
    PrimitiveDateTime::parse(&naive, NAIVE_TIMESTAMP)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

const NAIVE_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(
                target = "sanluis::store::decode",
                value = raw,
                "unparseable timestamp treated as missing"
            );
        }
        parsed
    }))
}

fn tags_without_nulls<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Option<String>>>::deserialize(deserializer).map(compact_tags)
}

fn status_from_text<'de, D>(deserializer: D) -> Result<Option<PostStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(PostStatus::from_db))
}

// Supabase tables use uuid, bigint or text keys; all of them are opaque here.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct OpaqueId;

    impl Visitor<'_> for OpaqueId {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(OpaqueId)
}
