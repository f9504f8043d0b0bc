//! Locked, verified access to one record through an in-memory cache.
//!
//! A [`SyncedRecord`] pairs a record path with a [`Schema`] and a lock
//! strategy. Every accessor runs one complete cycle:
//!
//! 1. acquire the lock (shared for reads, exclusive for writes)
//! 2. open a [`RecordHandle`] under it
//! 3. read, or read-modify-write
//! 4. re-read and compare with what was expected
//! 5. release the lock
//!
//! No lock is ever held between two calls. The cache is only replaced after
//! step 4 succeeded, so a failed call leaves it exactly as it was.
//!
//! # Example
//!
//! ```no_run
//! use recsync::schema::JsonSchema;
//! use recsync::synced::{SyncOptions, SyncedRecord};
//!
//! # fn main() -> recsync::error::Result<()> {
//! let mut record = SyncedRecord::open(
//!     "Sim.json",
//!     JsonSchema::<Vec<String>>::new(),
//!     &SyncOptions::default(),
//! )?;
//! record.write(|tags| tags.push("foo".to_string()))?;
//! assert!(record.compare()?);
//! # Ok(())
//! # }
//! ```


use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::locks::{LockMode, LockStrategy, StrategyKind, WaitPolicy, build_strategy};
use crate::record::{Access, RecordHandle};
use crate::schema::Schema;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Construction options for [`SyncedRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub strategy: StrategyKind,
    pub lock_suffix: String,
    pub wait: WaitPolicy,
    pub max_read_attempts: u32,
    pub max_write_attempts: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SyncOptions {
    /// Options described by a loaded config file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.strategy,
            lock_suffix: config.lock_suffix.clone(),
            wait: config.wait_policy(),
            max_read_attempts: config.max_read_attempts,
            max_write_attempts: config.max_write_attempts,
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    fn locker(&self) -> Box<dyn LockStrategy> {
        build_strategy(self.strategy, &self.lock_suffix, self.wait)
    }
}

/// A record whose cache is kept equal to its persisted state.
pub struct SyncedRecord<S: Schema> {
    path: PathBuf,
    schema: S,
    locker: Box<dyn LockStrategy>,
    max_read_attempts: u32,
    max_write_attempts: u32,
    cache: S::Cache,
    created: bool,
}

impl<S: Schema> SyncedRecord<S> {
    /// Open `path`, creating it from the schema default when absent.
    ///
    /// Missing parent directories are created. When several processes open
    /// the same new path at once, exactly one of them writes the default;
    /// the others read what it wrote.
    pub fn open(path: impl AsRef<Path>, schema: S, options: &SyncOptions) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| SyncError::from_io(e, "create record directory", parent))?;
        }

        let mut record = Self::unloaded(path, schema, options);
        match record.load() {
            Ok(()) => {}
            Err(SyncError::NotFound(_)) => record.create_if_absent()?,
            Err(e) => return Err(e),
        }
        Ok(record)
    }

    /// Open a record that must already exist.
    pub fn open_existing(path: impl AsRef<Path>, schema: S, options: &SyncOptions) -> Result<Self> {
        let mut record = Self::unloaded(path.as_ref(), schema, options);
        record.load()?;
        Ok(record)
    }

    fn unloaded(path: &Path, schema: S, options: &SyncOptions) -> Self {
        let cache = schema.default_cache();
        Self {
            path: path.to_path_buf(),
            schema,
            locker: options.locker(),
            max_read_attempts: options.max_read_attempts.max(1),
            max_write_attempts: options.max_write_attempts.max(1),
            cache,
            created: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cache as of the last successful read or write.
    ///
    /// This does not touch the disk; call [`read`](Self::read) for a fresh view.
    pub fn cache(&self) -> &S::Cache {
        &self.cache
    }

    /// Whether [`open`](Self::open) wrote the record.
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Reload the cache from disk under a shared lock.
    pub fn read(&mut self) -> Result<&S::Cache> {
        self.load()?;
        Ok(&self.cache)
    }

    /// Reload, then project the fresh cache through `f`.
    pub fn get<R>(&mut self, f: impl FnOnce(&S::Cache) -> R) -> Result<R> {
        self.load()?;
        Ok(f(&self.cache))
    }

    /// Apply `mutate` to the current persisted state under an exclusive lock.
    ///
    /// The record is re-read after the lock is taken, so changes made by
    /// other processes since the last read are never overwritten.
    pub fn write<R>(&mut self, mutate: impl FnOnce(&mut S::Cache) -> R) -> Result<R> {
        self.try_write(|cache| Ok(mutate(cache)))
    }

    /// Like [`write`](Self::write), for mutations that can fail.
    ///
    /// When `mutate` returns an error nothing is persisted.
    pub fn try_write<R>(
        &mut self,
        mutate: impl FnOnce(&mut S::Cache) -> Result<R>,
    ) -> Result<R> {
        let (cache, value) = self.with_access(Access::Write, |handle| {
            let current = self.read_verified(handle)?;
            let mut next = current.clone();
            let value = mutate(&mut next)?;

            if next != current {
                let bytes = self.schema.encode(&next)?;
                self.persist_verified(handle, &next, &bytes)?;
            } else {
                log::debug!("'{}' unchanged; nothing to persist", self.path.display());
            }
            Ok((next, value))
        })?;

        self.cache = cache;
        Ok(value)
    }

    /// Whether the persisted record still equals the cache.
    ///
    /// A record that no longer decodes is reported as different.
    pub fn compare(&mut self) -> Result<bool> {
        self.with_access(Access::Read, |handle| {
            let bytes = handle.read_bytes()?;
            match self.decode(&bytes) {
                Ok(persisted) => Ok(persisted == self.cache),
                Err(SyncError::Corrupt(reason)) => {
                    log::warn!("{}", reason);
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
    }

    /// Run `f` with the record open under a lock of `mode`.
    ///
    /// The lock is released when `f` returns, whatever the outcome. The
    /// cache is not touched.
    pub fn with_lock<R>(
        &mut self,
        mode: LockMode,
        f: impl FnOnce(&mut RecordHandle) -> Result<R>,
    ) -> Result<R> {
        let access = if mode.is_exclusive() {
            Access::Write
        } else {
            Access::Read
        };
        self.with_access(access, f)
    }

    fn with_access<R>(
        &self,
        access: Access,
        f: impl FnOnce(&mut RecordHandle) -> Result<R>,
    ) -> Result<R> {
        let token = match access {
            Access::Read => self.locker.acquire(&self.path, LockMode::Shared)?,
            Access::Write => self.locker.acquire(&self.path, LockMode::Exclusive)?,
            Access::Create => self.locker.acquire_for_create(&self.path)?,
        };

        // The handle is dropped before the lock goes away.
        let outcome = RecordHandle::open(&self.path, access, &token)
            .and_then(|mut handle| f(&mut handle));

        match (outcome, token.release()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), released) => {
                if let Err(release_err) = released {
                    log::warn!("{}", release_err);
                }
                Err(e)
            }
        }
    }

    fn load(&mut self) -> Result<()> {
        let cache = self.with_access(Access::Read, |handle| self.read_verified(handle))?;
        self.cache = cache;
        Ok(())
    }

    /// Write the default unless another process got there first.
    fn create_if_absent(&mut self) -> Result<()> {
        let (cache, created) = self.with_access(Access::Create, |handle| {
            if handle.is_initialized()? {
                log::debug!("'{}' was created concurrently", self.path.display());
                return Ok((self.read_verified(handle)?, false));
            }

            let cache = self.schema.default_cache();
            let bytes = self.schema.encode(&cache)?;
            self.persist_verified(handle, &cache, &bytes)?;
            log::debug!("created '{}'", self.path.display());
            Ok((cache, true))
        })?;

        self.cache = cache;
        self.created = created;
        Ok(())
    }

    /// Decode the record twice and accept it once both passes agree.
    fn read_verified(&self, handle: &mut RecordHandle) -> Result<S::Cache> {
        for attempt in 1..=self.max_read_attempts {
            let first = self.decode(&handle.read_bytes()?)?;
            let second = self.decode(&handle.read_bytes()?)?;
            if first == second {
                return Ok(first);
            }
            log::warn!(
                "read of '{}' did not verify (attempt {}/{})",
                self.path.display(),
                attempt,
                self.max_read_attempts
            );
        }

        Err(SyncError::Conflict(format!(
            "'{}' read back differently on each of {} attempts",
            self.path.display(),
            self.max_read_attempts
        )))
    }

    /// Persist `bytes` until the record decodes back to `expected`.
    fn persist_verified(
        &self,
        handle: &mut RecordHandle,
        expected: &S::Cache,
        bytes: &[u8],
    ) -> Result<()> {
        for attempt in 1..=self.max_write_attempts {
            handle.write_bytes(bytes)?;
            let persisted = self.decode(&handle.read_bytes()?)?;
            if &persisted == expected {
                return Ok(());
            }
            log::warn!(
                "write of '{}' did not verify (attempt {}/{})",
                self.path.display(),
                attempt,
                self.max_write_attempts
            );
        }

        Err(SyncError::Conflict(format!(
            "'{}' did not persist as written after {} attempts",
            self.path.display(),
            self.max_write_attempts
        )))
    }

    fn decode(&self, bytes: &[u8]) -> Result<S::Cache> {
        self.schema.decode(bytes).map_err(|e| match e {
            SyncError::Corrupt(reason) => {
                SyncError::Corrupt(format!("'{}': {}", self.path.display(), reason))
            }
            other => other,
        })
    }
}

impl<S: Schema> fmt::Debug for SyncedRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncedRecord")
            .field("path", &self.path)
            .field("strategy", &self.locker.kind())
            .field("cache", &self.cache)
            .finish()
    }
}
