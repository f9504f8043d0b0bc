use super::*;
use crate::locks::{AdvisoryLock, LockMode, LockStrategy, MarkerLock, WaitPolicy};
use tempfile::TempDir;

fn marker() -> MarkerLock {
    MarkerLock::new(".lock", WaitPolicy::no_wait())
}

fn advisory() -> AdvisoryLock {
    AdvisoryLock::new(WaitPolicy::no_wait())
}

#[test]
fn marker_handle_reads_and_replaces() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");
    fs::write(&record, "old").unwrap();

    let token = marker().acquire(&record, LockMode::Exclusive).unwrap();
    let mut handle = RecordHandle::open(&record, Access::Write, &token).unwrap();

    assert_eq!(handle.read_bytes().unwrap(), b"old");
    handle.write_bytes(b"new content").unwrap();
    assert_eq!(handle.read_bytes().unwrap(), b"new content");
    assert_eq!(fs::read(&record).unwrap(), b"new content");
}

#[test]
fn advisory_handle_writes_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");
    fs::write(&record, "a much longer original body").unwrap();

    let token = advisory().acquire(&record, LockMode::Exclusive).unwrap();
    let mut handle = RecordHandle::open(&record, Access::Write, &token).unwrap();

    handle.write_bytes(b"short").unwrap();
    assert_eq!(handle.read_bytes().unwrap(), b"short");
    assert_eq!(fs::read(&record).unwrap(), b"short");
}

#[test]
fn empty_record_reads_as_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");

    let token = advisory().acquire_for_create(&record).unwrap();
    let mut handle = RecordHandle::open(&record, Access::Create, &token).unwrap();

    assert!(!handle.is_initialized().unwrap());
    assert!(matches!(handle.read_bytes(), Err(SyncError::NotFound(_))));

    handle.write_bytes(b"{}").unwrap();
    assert!(handle.is_initialized().unwrap());
}

#[test]
fn missing_record_under_marker_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");

    let token = marker().acquire(&record, LockMode::Shared).unwrap();
    let mut handle = RecordHandle::open(&record, Access::Read, &token).unwrap();

    assert!(!handle.is_initialized().unwrap());
    assert!(matches!(handle.read_bytes(), Err(SyncError::NotFound(p)) if p == record));
}

#[test]
fn read_access_refuses_writes() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");
    fs::write(&record, "{}").unwrap();

    let token = marker().acquire(&record, LockMode::Exclusive).unwrap();
    let mut handle = RecordHandle::open(&record, Access::Read, &token).unwrap();

    assert!(matches!(
        handle.write_bytes(b"x"),
        Err(SyncError::InvalidState(_))
    ));
    assert_eq!(fs::read(&record).unwrap(), b"{}");
}

#[test]
fn write_access_requires_exclusive_lock() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");
    fs::write(&record, "{}").unwrap();

    let token = advisory().acquire(&record, LockMode::Shared).unwrap();
    let err = RecordHandle::open(&record, Access::Write, &token).unwrap_err();

    assert!(matches!(err, SyncError::InvalidState(_)));
}

#[test]
fn token_for_other_record_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let record = temp_dir.path().join("Sim.json");
    let other = temp_dir.path().join("Other.json");
    fs::write(&record, "{}").unwrap();

    let token = marker().acquire(&record, LockMode::Exclusive).unwrap();
    let err = RecordHandle::open(&other, Access::Read, &token).unwrap_err();

    assert!(matches!(err, SyncError::InvalidState(_)));
}
