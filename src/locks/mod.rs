//! Locking subsystem for recsync.
//!
//! A lock is scoped to exactly one record. Two interchangeable strategies
//! implement the [`LockStrategy`] capability:
//!
//! - [`MarkerLock`]: a sibling marker file (`Sim.json.lock`) created with
//!   **create_new** semantics. Exclusive only; shared requests are served
//!   exclusively.
//! - [`AdvisoryLock`]: shared/exclusive `flock` locks on the record's own
//!   descriptor. No extra path is needed.
//!
//! # Lock Metadata
//!
//! Marker files contain JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `pid`: The process ID (optional)
//! - `created_at`: RFC3339 timestamp
//! - `mode`: `shared` or `exclusive`
//!
//! # RAII Tokens
//!
//! Every acquisition returns a [`LockToken`] that releases the lock when
//! dropped, on success and error paths alike. If release fails during drop,
//! a warning is logged but the program does not crash.

mod advisory;
mod guard;
mod marker;
mod metadata;
mod operations;
mod strategy;
mod types;
mod wait;


pub use advisory::AdvisoryLock;
pub use guard::LockToken;
pub use marker::{MarkerLock, marker_path};
pub use metadata::LockMetadata;
pub use operations::{clear_lock, list_locks};
pub use strategy::{LockStrategy, build_strategy};
pub use types::{LockInfo, LockMode, StrategyKind};
pub use wait::WaitPolicy;
