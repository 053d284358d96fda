//! Filesystem lock marker for mutual exclusion across processes.
//!
//! The marker file's existence is the lock; its content is the owning
//! process id, kept purely for debugging a stuck store. Acquisition uses an
//! exclusive create (create-if-absent, fail-if-present in one syscall), so
//! two racing acquirers cannot both succeed.

use crate::error::{StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Default sleep between acquisition attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock backed by a marker file.
///
/// One `FileLock` instance guards one logical operation: acquire, do the
/// work, release. Release is idempotent, and `Drop` removes the marker as a
/// backstop for early returns, but callers should release explicitly.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    retry_interval: Duration,
    held: bool,
}

impl FileLock {
    /// Creates a lock over the given marker path. Nothing is touched on
    /// disk until [`acquire`](Self::acquire).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            held: false,
        }
    }

    /// Overrides the sleep between acquisition attempts.
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Returns the marker path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if this instance currently holds the lock.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Acquires the lock, retrying until `timeout` elapses.
    ///
    /// Fails with [`StoreError::LockTimeout`] if the marker stays held for
    /// the whole window, or [`StoreError::Unavailable`] on any filesystem
    /// error other than the marker already existing.
    pub async fn acquire(&mut self, timeout: Duration) -> StoreResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.path)
                .await
            {
                Ok(mut marker) => {
                    self.held = true;
                    // Owner tag is best-effort; the marker's existence is
                    // the lock.
                    let pid = std::process::id().to_string();
                    if let Err(err) = marker.write_all(pid.as_bytes()).await {
                        warn!(path = %self.path.display(), "failed to tag lock marker: {err}");
                    }
                    debug!(path = %self.path.display(), pid = %pid, "lock acquired");
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        debug!(path = %self.path.display(), "lock acquisition timed out");
                        return Err(StoreError::LockTimeout(timeout));
                    }
                    sleep(self.retry_interval).await;
                }
                Err(err) => return Err(StoreError::Unavailable(err)),
            }
        }
    }

    /// Releases the lock by removing the marker.
    ///
    /// Idempotent: releasing twice, or without a prior acquire, is a no-op.
    /// An unexpected filesystem error is logged and never raised.
    pub async fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "lock released"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.path.display(), "failed to remove lock marker: {err}");
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), "failed to remove lock marker on drop: {err}");
            }
        }
    }
}
