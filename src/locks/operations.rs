//! Administrative operations on lock markers: listing and clearing.
//!
//! These only apply to the marker strategy. Advisory locks vanish with the
//! process that held them and leave nothing on disk to inspect.

use super::marker::{marker_path, remove_marker};
use super::metadata::LockMetadata;
use super::types::LockInfo;
use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// List all lock markers with `suffix` directly inside `dir`.
///
/// Markers whose metadata cannot be parsed are still listed, aged by their
/// modification time, since an unreadable marker blocks access just the same.
pub fn list_locks(dir: &Path, suffix: &str, stale_minutes: u32) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !dir.exists() {
        return Ok(locks);
    }

    let entries = fs::read_dir(dir).map_err(|e| SyncError::from_io(e, "read directory", dir))?;

    for entry in entries {
        let entry = entry.map_err(|e| SyncError::from_io(e, "read directory entry", dir))?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(record_name) = name.strip_suffix(suffix) else {
            continue;
        };
        if record_name.is_empty() || !path.is_file() {
            continue;
        }

        let record = path.with_file_name(record_name);
        locks.push(inspect_marker(path, record, stale_minutes));
    }

    locks.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(locks)
}

/// Remove the lock marker guarding `record`.
///
/// The caller is responsible for deciding that clearing is appropriate (the
/// CLI requires `--force`). Returns the marker's details for reporting.
pub fn clear_lock(record: &Path, suffix: &str, stale_minutes: u32) -> Result<LockInfo> {
    let lock_path = marker_path(record, suffix);

    if !lock_path.exists() {
        return Err(SyncError::UserError(format!(
            "no lock marker for '{}' at: {}",
            record.display(),
            lock_path.display()
        )));
    }

    let info = inspect_marker(lock_path, record.to_path_buf(), stale_minutes);
    remove_marker(&info.path)?;
    log::warn!("cleared lock marker '{}'", info.path.display());

    Ok(info)
}

fn inspect_marker(path: PathBuf, record: PathBuf, stale_minutes: u32) -> LockInfo {
    let metadata = match LockMetadata::read(&path) {
        Ok(meta) => Some(meta),
        Err(e) => {
            log::debug!("unreadable lock marker '{}': {}", path.display(), e);
            None
        }
    };

    let (age_minutes, is_stale) = match &metadata {
        Some(meta) => (meta.age().num_minutes(), meta.is_stale(stale_minutes)),
        None => {
            let age_minutes = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .map(|t| Utc::now().signed_duration_since(DateTime::<Utc>::from(t)).num_minutes())
                .unwrap_or(0);
            (age_minutes, age_minutes > i64::from(stale_minutes))
        }
    };

    LockInfo {
        path,
        record,
        metadata,
        age_minutes,
        is_stale,
    }
}
