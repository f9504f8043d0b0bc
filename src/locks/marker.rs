//! Exclusive-only locking through an atomically created marker file.
//!
//! The marker is a sibling of the record named `<record><suffix>`. Creating it
//! with `create_new` is the acquire operation: success proves that nobody
//! else holds the lock. Deleting it is the release. The marker carries JSON
//! [`LockMetadata`] so that an orphan left by a crashed process can be traced.

use super::guard::LockToken;
use super::metadata::LockMetadata;
use super::strategy::LockStrategy;
use super::types::{LockMode, StrategyKind};
use super::wait::WaitPolicy;
use crate::error::{Result, SyncError};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Marker-file lock strategy.
#[derive(Debug, Clone)]
pub struct MarkerLock {
    suffix: String,
    wait: WaitPolicy,
}

impl MarkerLock {
    pub fn new(suffix: impl Into<String>, wait: WaitPolicy) -> Self {
        Self {
            suffix: suffix.into(),
            wait,
        }
    }

    /// Path of the marker guarding `record`.
    pub fn lock_path(&self, record: &Path) -> PathBuf {
        marker_path(record, &self.suffix)
    }

    /// Make one attempt at creating the marker.
    ///
    /// Returns `Ok(None)` when another holder owns it.
    pub fn try_acquire(&self, record: &Path, mode: LockMode) -> Result<Option<LockToken>> {
        let lock_path = self.lock_path(record);
        let metadata = LockMetadata::new(mode);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::NotFound(record.to_path_buf()));
            }
            Err(e) => return Err(SyncError::from_io(e, "create lock marker", &lock_path)),
        };

        // From here on the marker is ours; the token removes it on any error.
        let token = LockToken::marker(record.to_path_buf(), lock_path.clone());

        let json = metadata.to_json()?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| SyncError::from_io(e, "write lock metadata", &lock_path))?;

        log::debug!("acquired lock marker '{}' for {}", lock_path.display(), mode);
        Ok(Some(token))
    }

    fn describe_holder(&self, record: &Path) -> String {
        let lock_path = self.lock_path(record);
        match LockMetadata::read(&lock_path) {
            Ok(meta) => format!("; held by {}", meta.holder_summary()),
            Err(_) => String::new(),
        }
    }
}

impl LockStrategy for MarkerLock {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Marker
    }

    fn acquire(&self, record: &Path, mode: LockMode) -> Result<LockToken> {
        let what = format!("lock '{}'", self.lock_path(record).display());
        self.wait
            .wait(&what, || self.try_acquire(record, mode))
            .map_err(|e| match e {
                SyncError::LockTimeout(msg) => {
                    SyncError::LockTimeout(format!("{}{}", msg, self.describe_holder(record)))
                }
                other => other,
            })
    }
}

/// Marker path for `record` with the given suffix.
pub fn marker_path(record: &Path, suffix: &str) -> PathBuf {
    let mut name = record.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Remove a marker file, treating a missing marker as already removed.
pub(super) fn remove_marker(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SyncError::from_io(e, "remove lock marker", path)),
    }
}
