//! Application services layer.

pub mod blog;
pub mod error;
pub mod store;
