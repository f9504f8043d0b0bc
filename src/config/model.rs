//! Config struct definition and default implementation.

use crate::locks::StrategyKind;
use serde::{Deserialize, Serialize};

/// Configuration for record synchronization.
///
/// This struct represents the contents of a `recsync.yaml` file.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Which locking strategy guards records.
    pub strategy: StrategyKind,

    /// Suffix appended to a record path to name its marker file.
    #[serde(default = "default_lock_suffix")]
    pub lock_suffix: String,

    /// Maximum wait for a lock in milliseconds; `null` waits forever.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: Option<u64>,

    /// First sleep between acquisition attempts.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Cap for the doubling sleep between attempts.
    #[serde(default = "default_max_retry_interval_ms")]
    pub max_retry_interval_ms: u64,

    /// Minutes after which a marker is reported as stale.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,

    // =========================================================================
    // Verification settings
    // =========================================================================
    /// Read passes allowed before a read reports a conflict.
    #[serde(default = "default_attempts")]
    pub max_read_attempts: u32,

    /// Persist-and-verify passes allowed before a write reports a conflict.
    #[serde(default = "default_attempts")]
    pub max_write_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            lock_suffix: default_lock_suffix(),
            lock_timeout_ms: default_lock_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_retry_interval_ms: default_max_retry_interval_ms(),
            lock_stale_minutes: default_lock_stale_minutes(),
            max_read_attempts: default_attempts(),
            max_write_attempts: default_attempts(),
        }
    }
}

pub(crate) fn default_lock_suffix() -> String {
    ".lock".to_string()
}

pub(crate) fn default_lock_timeout_ms() -> Option<u64> {
    Some(30_000)
}

pub(crate) fn default_retry_interval_ms() -> u64 {
    50
}

pub(crate) fn default_max_retry_interval_ms() -> u64 {
    1_000
}

pub(crate) fn default_lock_stale_minutes() -> u32 {
    120
}

pub(crate) fn default_attempts() -> u32 {
    5
}
