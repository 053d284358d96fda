//! File-backed JSON document store for the Roastery mock backend.
//!
//! The whole backend persists as a single pretty-printed JSON file. This
//! crate owns that file: it serializes concurrent access through a
//! lock-marker file, self-heals structural corruption, writes atomically
//! via temp-file + rename, and exposes CRUD accessors for the `users`
//! collection.
//!
//! # Architecture
//!
//! - [`FileLock`] — mutual exclusion using only the filesystem as shared
//!   state (multiple processes may share the store)
//! - [`DocumentStore`] — reader/writer for the document, plus the user
//!   accessors; every accessor runs as one locked critical section
//! - [`StoreConfig`] — explicit handle configuration; construct one store
//!   per process and pass it to route handlers, there is no global
//!
//! # Concurrency
//!
//! Each mutating accessor acquires the lock once and performs its full
//! read-modify-write under it, so concurrent `create_user` calls always
//! assign distinct ids. Only lock acquisition has a timeout; the file I/O
//! under the lock does not.

mod config;
mod document;
mod error;
mod health;
mod lock;
mod users;

pub use config::{CorruptionPolicy, StoreConfig};
pub use document::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use health::HealthReport;
pub use lock::FileLock;
