//! Store configuration and derived sibling paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when the backing file exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptionPolicy {
    /// Preserve the unreadable file as `<file>.corrupted.<millis>` and
    /// start over with a fresh empty document.
    #[default]
    SnapshotAndReset,

    /// Fail the read with [`StoreError::Corrupt`](crate::StoreError::Corrupt)
    /// and leave the file untouched. Use this when silently discarding the
    /// collections is unacceptable.
    Fail,
}

/// Configuration for a [`DocumentStore`](crate::DocumentStore).
///
/// All sibling paths (lock marker, backup, temp file, corruption snapshots)
/// are derived from the document path, so a store is fully described by one
/// file location plus the lock timing knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON document.
    pub path: PathBuf,
    /// How long `acquire` keeps retrying before giving up.
    pub lock_timeout: Duration,
    /// Sleep between lock acquisition attempts.
    pub lock_retry_interval: Duration,
    /// Recovery behavior for an unparsable backing file.
    pub corruption_policy: CorruptionPolicy,
}

impl StoreConfig {
    /// Creates a configuration with default lock timing (5 s timeout,
    /// 10 ms retry interval) and the default corruption policy.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_secs(5),
            lock_retry_interval: Duration::from_millis(10),
            corruption_policy: CorruptionPolicy::default(),
        }
    }

    /// Overrides the lock acquisition timeout.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Overrides the sleep between lock acquisition attempts.
    #[must_use]
    pub fn with_lock_retry_interval(mut self, interval: Duration) -> Self {
        self.lock_retry_interval = interval;
        self
    }

    /// Overrides the corruption policy.
    #[must_use]
    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.corruption_policy = policy;
        self
    }

    /// Path of the lock marker file (`<file>.lock`).
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    /// Path of the single-generation backup (`<file>.backup`).
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, "backup")
    }

    /// Path of the temporary file used for atomic writes (`<file>.tmp`).
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    /// Path for a corruption snapshot taken at the given epoch-millisecond
    /// timestamp (`<file>.corrupted.<millis>`).
    #[must_use]
    pub fn corruption_snapshot_path(&self, timestamp_millis: i64) -> PathBuf {
        sibling(&self.path, &format!("corrupted.{timestamp_millis}"))
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
