//! recsync: process-safe synchronized access to shared on-disk records.
//!
//! Several independent processes may read and mutate the same record file
//! without a coordinator. Each access takes a per-record lock, works on the
//! record through a [`record::RecordHandle`], verifies the result and
//! releases the lock before returning.
//!
//! The layers, leaves first:
//!
//! - [`locks`]: marker-file and advisory `flock` strategies behind one trait
//! - [`record`]: byte-level I/O on a record while its lock is held
//! - [`synced`]: [`synced::SyncedRecord`], the cached read/write/compare API
//! - [`schema`]: codecs between bytes and caches, including treant state
//! - [`treant`]: the treant domain object built on top of all of the above

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod logging;
pub mod record;
pub mod schema;
pub mod synced;
pub mod treant;
