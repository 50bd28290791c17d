//! Domain layer types and invariants.

pub mod blog;
pub mod entities;
pub mod types;
