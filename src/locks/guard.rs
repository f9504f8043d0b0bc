//! RAII lock token implementation.

use super::types::{LockMode, StrategyKind};
use crate::error::{Result, SyncError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Proof of lock ownership for one record.
///
/// When dropped, the lock is released. If release fails during drop, a
/// warning is logged but no panic occurs. Use [`LockToken::release`] to
/// observe release errors.
#[derive(Debug)]
pub struct LockToken {
    /// The record this lock guards.
    record: PathBuf,

    /// Mode actually held.
    mode: LockMode,

    held: Held,

    /// Whether the lock has been released manually.
    released: bool,
}

#[derive(Debug)]
enum Held {
    /// A marker file whose existence is the lock.
    Marker { path: PathBuf },
    /// A `flock` held on an open description of the record.
    Advisory { file: File },
}

impl LockToken {
    pub(super) fn marker(record: PathBuf, marker: PathBuf) -> Self {
        Self {
            record,
            mode: LockMode::Exclusive,
            held: Held::Marker { path: marker },
            released: false,
        }
    }

    pub(super) fn advisory(record: PathBuf, file: File, mode: LockMode) -> Self {
        Self {
            record,
            mode,
            held: Held::Advisory { file },
            released: false,
        }
    }

    /// The record this token guards.
    pub fn record(&self) -> &Path {
        &self.record
    }

    /// The mode held. Marker locks are always exclusive.
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// The strategy that produced this token.
    pub fn kind(&self) -> StrategyKind {
        match self.held {
            Held::Marker { .. } => StrategyKind::Marker,
            Held::Advisory { .. } => StrategyKind::Advisory,
        }
    }

    /// Path of the marker file, for marker locks.
    pub fn marker_path(&self) -> Option<&Path> {
        match &self.held {
            Held::Marker { path } => Some(path),
            Held::Advisory { .. } => None,
        }
    }

    /// The locked descriptor, for advisory locks.
    pub(crate) fn descriptor(&self) -> Option<&File> {
        match &self.held {
            Held::Marker { .. } => None,
            Held::Advisory { file } => Some(file),
        }
    }

    /// Manually release the lock and report any failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.release_held()
    }

    fn release_held(&self) -> Result<()> {
        match &self.held {
            Held::Marker { path } => match fs::remove_file(path) {
                Ok(()) => {
                    log::debug!("released lock marker '{}'", path.display());
                    Ok(())
                }
                // Someone cleared the marker already; nothing left to release.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::warn!("lock marker '{}' vanished before release", path.display());
                    Ok(())
                }
                Err(e) => Err(SyncError::from_io(e, "release lock marker", path)),
            },
            Held::Advisory { file } => {
                fs2::FileExt::unlock(file).map_err(|e| {
                    SyncError::InvalidState(format!(
                        "failed to unlock '{}': {}",
                        self.record.display(),
                        e
                    ))
                })?;
                log::debug!("released {} lock on '{}'", self.mode, self.record.display());
                Ok(())
            }
        }
    }
}

impl Drop for LockToken {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.release_held()
        {
            log::warn!("failed to release lock on '{}': {}", self.record.display(), e);
        }
    }
}
