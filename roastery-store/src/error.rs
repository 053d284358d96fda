//! Error types for the store layer.

use roastery_types::UserId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The lock marker could not be acquired within the configured window.
    /// The operation was not attempted.
    #[error("lock not acquired within {0:?}")]
    LockTimeout(std::time::Duration),

    /// A write was rejected because the candidate document (or record
    /// payload) is not a JSON object.
    #[error("document is not a JSON object")]
    InvalidDocument,

    /// A read failed for a reason other than parse-corruption
    /// (permissions, disk error).
    #[error("store unavailable: {0}")]
    Unavailable(#[source] std::io::Error),

    /// A write failed at the backup, serialize, write or rename step. The
    /// committed file is left at its last good state.
    #[error("store write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// No user record with the given id exists.
    #[error("user not found: {0}")]
    NotFound(UserId),

    /// The backing file is unparsable and the corruption policy is
    /// [`CorruptionPolicy::Fail`](crate::CorruptionPolicy::Fail).
    #[error("store file is corrupt: {}", .0.display())]
    Corrupt(PathBuf),
}
