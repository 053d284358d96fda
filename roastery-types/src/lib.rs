//! Core type definitions for the Roastery mock store.
//!
//! This crate defines the persisted document model shared by the store
//! layer and its callers:
//! - The top-level [`Document`] holding the `users`, `products`, `orders`
//!   and `customers` collections
//! - [`UserId`] — small monotonic integer identifiers (`max + 1` assignment)
//!
//! Individual records are raw `serde_json::Value` objects: their field
//! layout is owned by the HTTP layer, not by this crate. Only the fields
//! the store itself manages (`id`, `created_at`, `updated_at`, `email`)
//! have typed helpers here.

mod document;
mod ids;

pub use document::{Document, STORE_VERSION, record_email, record_user_id};
pub use ids::UserId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}
