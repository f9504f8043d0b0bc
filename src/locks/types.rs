//! Lock type definitions and information structures.

use super::metadata::{LockMetadata, format_age};
use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Access mode requested from a lock strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Any number of shared holders may coexist.
    Shared,
    /// A single holder, excluding all others.
    Exclusive,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, LockMode::Exclusive)
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which locking strategy guards a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Exclusive-only marker file created with `create_new` semantics.
    #[default]
    Marker,
    /// Shared/exclusive `flock` locks on the record's own descriptor.
    Advisory,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Marker => "marker",
            StrategyKind::Advisory => "advisory",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(StrategyKind::Marker),
            "advisory" => Ok(StrategyKind::Advisory),
            other => Err(SyncError::UserError(format!(
                "unknown lock strategy '{}' (expected 'marker' or 'advisory')",
                other
            ))),
        }
    }
}

/// Information about a lock marker found on disk.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The marker file path.
    pub path: PathBuf,

    /// The record the marker guards.
    pub record: PathBuf,

    /// The marker metadata, if it could be parsed.
    pub metadata: Option<LockMetadata>,

    /// Age of the marker in minutes.
    pub age_minutes: i64,

    /// Whether the marker is older than the stale threshold.
    pub is_stale: bool,
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.metadata {
            Some(meta) => write!(
                f,
                "{} (owner: {}, age: {}, mode: {}{})",
                self.record.display(),
                meta.owner,
                meta.age_string(),
                meta.mode,
                if self.is_stale { ", STALE" } else { "" }
            ),
            None => write!(
                f,
                "{} (unreadable marker, age: {}{})",
                self.record.display(),
                format_age(chrono::Duration::minutes(self.age_minutes)),
                if self.is_stale { ", STALE" } else { "" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_parses_case_insensitively() {
        assert_eq!("Marker".parse::<StrategyKind>().unwrap(), StrategyKind::Marker);
        assert_eq!(" advisory ".parse::<StrategyKind>().unwrap(), StrategyKind::Advisory);
        assert!("symlink".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn lock_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LockMode::Shared).unwrap(), "\"shared\"");
        assert_eq!(serde_json::to_string(&LockMode::Exclusive).unwrap(), "\"exclusive\"");
    }
}
