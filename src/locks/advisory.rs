//! Shared/exclusive advisory locking on the record's own descriptor.
//!
//! Locks are `flock`-style locks (through `fs2`), owned by the open file
//! description. Two handles opened separately contend with each other even
//! inside one process. Exclusive acquisition first takes a shared lock and
//! then converts it. The conversion is not atomic: Linux drops the shared
//! lock before trying for the exclusive one, and a failed non-blocking try
//! leaves nothing held. Both steps share one deadline.

use super::guard::LockToken;
use super::strategy::LockStrategy;
use super::types::{LockMode, StrategyKind};
use super::wait::WaitPolicy;
use crate::error::{Result, SyncError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::Instant;

/// Advisory lock strategy.
#[derive(Debug, Clone)]
pub struct AdvisoryLock {
    wait: WaitPolicy,
}

impl AdvisoryLock {
    pub fn new(wait: WaitPolicy) -> Self {
        Self { wait }
    }

    fn open(record: &Path, mode: LockMode, create: bool) -> Result<File> {
        let mut options = OpenOptions::new();
        options.read(true);
        if mode.is_exclusive() {
            options.write(true).create(create);
        }
        options
            .open(record)
            .map_err(|e| SyncError::from_io(e, "open record for locking", record))
    }

    fn lock(
        &self,
        file: &File,
        record: &Path,
        mode: LockMode,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let what = format!("{} lock on '{}'", mode, record.display());

        if deadline.is_none() {
            // Unbounded: let the OS queue us.
            let locked = match mode {
                LockMode::Shared => FileExt::lock_shared(file),
                LockMode::Exclusive => FileExt::lock_exclusive(file),
            };
            return locked.map_err(|e| lock_error(e, &what));
        }

        self.wait.wait_until(&what, deadline, || {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(file),
            };
            match attempt {
                Ok(()) => Ok(Some(())),
                Err(e) if is_contended(&e) => Ok(None),
                Err(e) => Err(lock_error(e, &what)),
            }
        })
    }

    fn acquire_on(&self, file: File, record: &Path, mode: LockMode) -> Result<LockToken> {
        let deadline = self.wait.deadline();
        self.lock(&file, record, LockMode::Shared, deadline)?;
        if mode.is_exclusive() {
            self.lock(&file, record, LockMode::Exclusive, deadline)?;
        }
        log::debug!("acquired {} lock on '{}'", mode, record.display());
        Ok(LockToken::advisory(record.to_path_buf(), file, mode))
    }
}

impl LockStrategy for AdvisoryLock {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Advisory
    }

    fn acquire(&self, record: &Path, mode: LockMode) -> Result<LockToken> {
        let file = Self::open(record, mode, false)?;
        self.acquire_on(file, record, mode)
    }

    fn acquire_for_create(&self, record: &Path) -> Result<LockToken> {
        let file = Self::open(record, LockMode::Exclusive, true)?;
        self.acquire_on(file, record, LockMode::Exclusive)
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn lock_error(err: io::Error, what: &str) -> SyncError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            SyncError::PermissionDenied(format!("failed to take {}: {}", what, err))
        }
        _ => SyncError::InvalidState(format!("failed to take {}: {}", what, err)),
    }
}
