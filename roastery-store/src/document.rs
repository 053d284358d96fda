//! Document reader and writer.
//!
//! Reads always yield a structurally complete document: a missing file is
//! lazily initialized, and an unparsable one is recovered according to the
//! configured [`CorruptionPolicy`]. Writes go through a temp file and an
//! atomic rename, so a concurrent reader sees either the fully-old or the
//! fully-new document, never a partial one.

use crate::config::{CorruptionPolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::lock::FileLock;
use chrono::Utc;
use roastery_types::{Document, STORE_VERSION};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Handle to the persisted store document.
///
/// Construct one per process from a [`StoreConfig`] and pass it by
/// reference to route handlers. All mutation of the backing file must go
/// through this type; nothing else may write it directly.
#[derive(Debug)]
pub struct DocumentStore {
    config: StoreConfig,
}

impl DocumentStore {
    /// Creates a store over the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store over the given document path with default
    /// configuration.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(path))
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Acquires the store lock for one logical operation.
    pub(crate) async fn lock(&self) -> StoreResult<FileLock> {
        let mut lock = FileLock::new(self.config.lock_path())
            .with_retry_interval(self.config.lock_retry_interval);
        lock.acquire(self.config.lock_timeout).await?;
        Ok(lock)
    }

    /// Reads the document, lazily creating it if absent and recovering
    /// corruption per the configured policy. Runs under the store lock for
    /// its full duration.
    pub async fn read(&self) -> StoreResult<Document> {
        let mut lock = self.lock().await?;
        let result = self.read_unlocked().await;
        lock.release().await;
        result
    }

    /// Persists the document durably and atomically, stamping
    /// `last_updated`. Returns the document as written. Runs under the
    /// store lock for its full duration.
    pub async fn write(&self, document: &Document) -> StoreResult<Document> {
        let mut lock = self.lock().await?;
        let result = self.write_unlocked(document.clone()).await;
        lock.release().await;
        result
    }

    /// Persists an untyped JSON value as the document.
    ///
    /// Rejects anything that is not a JSON object with
    /// [`StoreError::InvalidDocument`]; collection fields that are not
    /// arrays are coerced to empty arrays on the way in.
    pub async fn write_value(&self, value: Value) -> StoreResult<Document> {
        let document = Document::from_value(value).ok_or(StoreError::InvalidDocument)?;
        self.write(&document).await
    }

    pub(crate) async fn read_unlocked(&self) -> StoreResult<Document> {
        let content = match fs::read(&self.config.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.config.path.display(), "store file absent, creating fresh document");
                return self.write_unlocked(Document::new()).await;
            }
            Err(err) => return Err(StoreError::Unavailable(err)),
        };

        match serde_json::from_slice::<Value>(&content)
            .ok()
            .and_then(Document::from_value)
        {
            Some(document) => Ok(document),
            None => self.recover_corrupt().await,
        }
    }

    /// The backing file exists but is not a JSON object. Under
    /// `SnapshotAndReset` the unreadable file is preserved at a timestamped
    /// sibling path (best-effort, never blocks recovery) and the store
    /// starts over empty; under `Fail` nothing is touched.
    async fn recover_corrupt(&self) -> StoreResult<Document> {
        match self.config.corruption_policy {
            CorruptionPolicy::Fail => Err(StoreError::Corrupt(self.config.path.clone())),
            CorruptionPolicy::SnapshotAndReset => {
                let snapshot = self
                    .config
                    .corruption_snapshot_path(Utc::now().timestamp_millis());
                match fs::copy(&self.config.path, &snapshot).await {
                    Ok(_) => warn!(
                        path = %self.config.path.display(),
                        snapshot = %snapshot.display(),
                        "store file unparsable, snapshot preserved, resetting to empty"
                    ),
                    Err(err) => warn!(
                        path = %self.config.path.display(),
                        "store file unparsable and snapshot failed, resetting to empty: {err}"
                    ),
                }
                self.write_unlocked(Document::new()).await
            }
        }
    }

    pub(crate) async fn write_unlocked(&self, mut document: Document) -> StoreResult<Document> {
        document.last_updated = Some(Utc::now());
        if document.version.is_none() {
            document.version = Some(STORE_VERSION.to_string());
        }

        // Single-generation backup of the committed file, overwritten on
        // every write.
        match fs::copy(&self.config.path, self.config.backup_path()).await {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::WriteFailed(err)),
        }

        // Serialize failure is a write failure like any other step of the
        // commit.
        let mut serialized = serde_json::to_string_pretty(&document)
            .map_err(|err| StoreError::WriteFailed(err.into()))?;
        serialized.push('\n');

        let temp = self.config.temp_path();
        fs::write(&temp, serialized)
            .await
            .map_err(StoreError::WriteFailed)?;
        fs::rename(&temp, &self.config.path)
            .await
            .map_err(StoreError::WriteFailed)?;

        debug!(
            path = %self.config.path.display(),
            users = document.users.len(),
            "document committed"
        );
        Ok(document)
    }
}
