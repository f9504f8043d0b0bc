//! Byte-level access to one record file.
//!
//! A [`RecordHandle`] can only be opened with a [`LockToken`] for the same
//! record, so record I/O always happens under a held lock. It never takes
//! locks itself.
//!
//! How bytes reach the disk depends on the strategy behind the token:
//!
//! - Marker locks: the handle works on the path. Writes go through
//!   [`atomic_write`], so a crash leaves either the old or the new record.
//! - Advisory locks: the handle shares the token's locked descriptor and
//!   writes in place. Renaming a new file over the record would move the
//!   path to a fresh inode the lock does not cover.
//!
//! A zero-length record counts as absent: it was created but never
//! initialized.

#[cfg(test)]
mod tests;

use crate::error::{Result, SyncError};
use crate::fs::atomic_write;
use crate::locks::LockToken;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Access a record is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-only.
    Read,
    /// Read and rewrite an existing record.
    Write,
    /// Read and write, creating the record if absent.
    Create,
}

impl Access {
    pub fn writes(&self) -> bool {
        !matches!(self, Access::Read)
    }
}

/// An open record, valid while the lock it was opened with is held.
#[derive(Debug)]
pub struct RecordHandle {
    path: PathBuf,
    access: Access,
    backing: Backing,
}

#[derive(Debug)]
enum Backing {
    Path,
    Descriptor(File),
}

impl RecordHandle {
    /// Open `path` for `access` under `token`.
    pub fn open(path: &Path, access: Access, token: &LockToken) -> Result<Self> {
        if token.record() != path {
            return Err(SyncError::InvalidState(format!(
                "lock for '{}' cannot open '{}'",
                token.record().display(),
                path.display()
            )));
        }
        if access.writes() && !token.mode().is_exclusive() {
            return Err(SyncError::InvalidState(format!(
                "writing '{}' requires an exclusive lock, {} held",
                path.display(),
                token.mode()
            )));
        }

        let backing = match token.descriptor() {
            Some(file) => Backing::Descriptor(file.try_clone().map_err(|e| {
                SyncError::InvalidState(format!(
                    "locked descriptor for '{}' is unusable: {}",
                    path.display(),
                    e
                ))
            })?),
            None => Backing::Path,
        };

        Ok(Self {
            path: path.to_path_buf(),
            access,
            backing,
        })
    }

    /// Whether the record holds any bytes.
    pub fn is_initialized(&self) -> Result<bool> {
        let len = match &self.backing {
            Backing::Path => match fs::metadata(&self.path) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
                Err(e) => return Err(SyncError::from_io(e, "stat record", &self.path)),
            },
            Backing::Descriptor(file) => file
                .metadata()
                .map_err(|e| SyncError::from_io(e, "stat record", &self.path))?
                .len(),
        };
        Ok(len > 0)
    }

    /// Read the whole persisted record.
    ///
    /// An absent or empty record is `SyncError::NotFound`.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let bytes = match &mut self.backing {
            Backing::Path => {
                fs::read(&self.path).map_err(|e| SyncError::from_io(e, "read record", &self.path))?
            }
            Backing::Descriptor(file) => {
                let mut bytes = Vec::new();
                file.seek(SeekFrom::Start(0))
                    .and_then(|_| file.read_to_end(&mut bytes))
                    .map_err(|e| SyncError::from_io(e, "read record", &self.path))?;
                bytes
            }
        };

        if bytes.is_empty() {
            return Err(SyncError::NotFound(self.path.clone()));
        }
        Ok(bytes)
    }

    /// Replace the persisted record with `bytes` and sync it to disk.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.access.writes() {
            return Err(SyncError::InvalidState(format!(
                "record '{}' is open read-only",
                self.path.display()
            )));
        }

        match &mut self.backing {
            Backing::Path => atomic_write(&self.path, bytes),
            Backing::Descriptor(file) => {
                file.set_len(0)
                    .and_then(|()| file.seek(SeekFrom::Start(0)))
                    .and_then(|_| file.write_all(bytes))
                    .and_then(|()| file.sync_all())
                    .map_err(|e| SyncError::from_io(e, "write record", &self.path))
            }
        }
    }
}
