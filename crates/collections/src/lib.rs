//! Array and object helpers for Prodash
//!
//! Stateless leaf utilities:
//! - `map`, `filter`, `uniq`, `chunk` over slices
//! - `pick`, `omit` over hash maps and JSON objects

pub mod array;
pub mod object;

// Re-exports
pub use array::{chunk, filter, map, uniq};
pub use object::{omit, omit_json, pick, pick_json};

use thiserror::Error;

/// Errors raised by the collection helpers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    /// An argument is outside the accepted domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
