//! Filesystem utilities for recsync.
//!
//! Record files written under the marker strategy are replaced atomically so
//! a crash can never leave a half-written record behind.

pub mod atomic;

pub use atomic::atomic_write;
