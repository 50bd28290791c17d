//! Shared enumerations and the public post shape.

pub use sanluis_api_types::{BlogPost, Locale, LocalizedBlogPost, PostStatus, UnknownLocale};
