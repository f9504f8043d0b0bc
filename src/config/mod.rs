//! Configuration model for recsync.
//!
//! This module defines the Config struct that represents a `recsync.yaml`
//! file. It supports forward-compatible YAML parsing (unknown fields are
//! ignored), sensible defaults for optional fields, and validation of values.

mod model;
mod operations;

#[cfg(test)]
mod tests;

pub use model::Config;
