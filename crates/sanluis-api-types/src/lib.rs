//! Public response types for the San Luis Way blog content API.
//!
//! Page renderers and API clients depend on these shapes only. Fields
//! serialize in camelCase and timestamps as RFC 3339 strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Publication state of a post as held by the store.
///
/// Values the store may grow in the future decode as `Unknown` instead of
/// failing the whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    #[serde(other)]
    Unknown,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Unknown => "unknown",
        }
    }

    /// Interpret a raw textual status column.
    pub fn from_db(value: &str) -> Self {
        match value.trim() {
            v if v.eq_ignore_ascii_case("published") => PostStatus::Published,
            v if v.eq_ignore_ascii_case("draft") => PostStatus::Draft,
            _ => PostStatus::Unknown,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site languages. Spanish is primary; English lives in the `_en` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported locale `{0}`")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("es") => Ok(Locale::Es),
            v if v.eq_ignore_ascii_case("en") => Ok(Locale::En),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

/// Presentation-ready blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub title_en: Option<String>,
    pub content: String,
    #[serde(default)]
    pub content_en: Option<String>,
    pub excerpt: String,
    #[serde(default)]
    pub excerpt_en: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl BlogPost {
    /// Collapse the language variants into a single-language view.
    ///
    /// English text is used only when the `_en` variant is present and not
    /// blank; anything else falls back to the primary text.
    pub fn into_localized(self, locale: Locale) -> LocalizedBlogPost {
        let pick = |primary: String, secondary: Option<String>| match (locale, secondary) {
            (Locale::En, Some(text)) if !text.trim().is_empty() => text,
            _ => primary,
        };

        LocalizedBlogPost {
            id: self.id,
            slug: self.slug,
            locale,
            title: pick(self.title, self.title_en),
            content: pick(self.content, self.content_en),
            excerpt: pick(self.excerpt, self.excerpt_en),
            image_url: self.image_url,
            category: self.category,
            tags: self.tags,
            status: self.status,
            published_at: self.published_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedBlogPost {
    pub id: String,
    pub slug: String,
    pub locale: Locale,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> BlogPost {
        BlogPost {
            id: "1".into(),
            slug: "centro-historico".into(),
            title: "Centro Histórico".into(),
            title_en: Some("Historic Center".into()),
            content: "<p>Hola</p>".into(),
            content_en: Some("   ".into()),
            excerpt: "Resumen".into(),
            excerpt_en: None,
            image_url: Some("http://example.com/image.jpg".into()),
            category: "culture".into(),
            tags: vec!["centro".into()],
            status: PostStatus::Published,
            published_at: Some(datetime!(2024-03-01 12:00 UTC)),
            created_at: None,
        }
    }

    #[test]
    fn serializes_in_camel_case() {
        let value = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(value["imageUrl"], "http://example.com/image.jpg");
        assert_eq!(value["titleEn"], "Historic Center");
        assert_eq!(value["status"], "published");
        assert_eq!(value["publishedAt"], "2024-03-01T12:00:00Z");
        assert!(value["createdAt"].is_null());
        assert!(value.get("image_url").is_none());
    }

    #[test]
    fn english_view_falls_back_on_blank_variants() {
        let localized = sample().into_localized(Locale::En);
        assert_eq!(localized.title, "Historic Center");
        assert_eq!(localized.content, "<p>Hola</p>");
        assert_eq!(localized.excerpt, "Resumen");
        assert_eq!(localized.locale, Locale::En);
    }

    #[test]
    fn spanish_view_ignores_english_variants() {
        let localized = sample().into_localized(Locale::Es);
        assert_eq!(localized.title, "Centro Histórico");
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(" es ".parse::<Locale>(), Ok(Locale::Es));
        assert_eq!(
            "fr".parse::<Locale>(),
            Err(UnknownLocale("fr".to_string()))
        );
    }

    #[test]
    fn unrecognized_status_decodes_as_unknown() {
        let status: PostStatus = serde_json::from_str("\"archived\"").expect("decode");
        assert_eq!(status, PostStatus::Unknown);
        assert_eq!(PostStatus::from_db(" Published "), PostStatus::Published);
        assert_eq!(PostStatus::from_db("DRAFT"), PostStatus::Draft);
    }
}
