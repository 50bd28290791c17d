//! Read-only blog content access layer for the San Luis Way site.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
