//! What a lock marker says about its holder.

use super::types::LockMode;
use crate::error::{Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// JSON body of a marker file.
///
/// Written once when the marker is created and never updated, so
/// `created_at` also tells how long the lock has been held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// `user@host` of the holder.
    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    pub created_at: DateTime<Utc>,

    /// The mode the holder asked for.
    pub mode: LockMode,
}

impl LockMetadata {
    /// Describe the current process taking a lock in `mode`.
    pub fn new(mode: LockMode) -> Self {
        Self {
            owner: owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            mode,
        }
    }

    /// Read the metadata of an existing marker.
    ///
    /// A marker that exists but does not parse is `SyncError::Corrupt`.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| SyncError::from_io(e, "read lock marker", path))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            SyncError::Corrupt(format!("lock marker '{}' is unreadable: {}", path.display(), e))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SyncError::InvalidState(format!("lock metadata does not serialize: {}", e))
        })
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Age as `45m`, `3h 5m` or `2d 4h`.
    pub fn age_string(&self) -> String {
        format_age(self.age())
    }

    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age() > Duration::minutes(i64::from(stale_minutes))
    }

    /// One-line description of the holder for error messages.
    pub fn holder_summary(&self) -> String {
        match self.pid {
            Some(pid) => format!("{} (pid {}) for {}", self.owner, pid, self.age_string()),
            None => format!("{} for {}", self.owner, self.age_string()),
        }
    }
}

pub(crate) fn format_age(age: Duration) -> String {
    let (days, hours, minutes) = (age.num_days(), age.num_hours(), age.num_minutes());
    match (days, hours) {
        (d, h) if d > 0 => format!("{}d {}h", d, h % 24),
        (_, h) if h > 0 => format!("{}h {}m", h, minutes % 60),
        _ => format!("{}m", minutes.max(0)),
    }
}

fn owner_string() -> String {
    let user = ["USER", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .unwrap_or_else(|| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
