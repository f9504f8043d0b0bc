//! The lock capability shared by both strategies.

use super::advisory::AdvisoryLock;
use super::guard::LockToken;
use super::marker::MarkerLock;
use super::types::{LockMode, StrategyKind};
use super::wait::WaitPolicy;
use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Acquires locks scoped to a single record.
///
/// Implementations block according to their [`WaitPolicy`] and hand back a
/// [`LockToken`] whose drop releases the lock.
pub trait LockStrategy: Send + Sync + fmt::Debug {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Acquire a lock on an existing record.
    fn acquire(&self, record: &Path, mode: LockMode) -> Result<LockToken>;

    /// Acquire an exclusive lock that allows the record to be created.
    fn acquire_for_create(&self, record: &Path) -> Result<LockToken> {
        self.acquire(record, LockMode::Exclusive)
    }
}

/// Build the strategy selected by `kind`.
pub fn build_strategy(kind: StrategyKind, suffix: &str, wait: WaitPolicy) -> Box<dyn LockStrategy> {
    match kind {
        StrategyKind::Marker => Box::new(MarkerLock::new(suffix, wait)),
        StrategyKind::Advisory => Box::new(AdvisoryLock::new(wait)),
    }
}
