//! Config loading, validation, and conversion operations.

use super::model::Config;
use crate::error::{Result, SyncError};
use crate::locks::WaitPolicy;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| SyncError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| SyncError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_suffix` must be non-empty and contain no path separator
    /// - retry intervals must be positive, the first no larger than the cap
    /// - `lock_stale_minutes` must be positive
    /// - `max_read_attempts` and `max_write_attempts` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.lock_suffix.is_empty() {
            return Err(invalid("lock_suffix must not be empty"));
        }
        if self.lock_suffix.contains('/') || self.lock_suffix.contains('\\') {
            return Err(SyncError::UserError(format!(
                "config validation failed: lock_suffix must not contain a path separator (found '{}')",
                self.lock_suffix
            )));
        }

        if self.retry_interval_ms == 0 || self.max_retry_interval_ms == 0 {
            return Err(invalid("retry intervals must be greater than 0"));
        }
        if self.retry_interval_ms > self.max_retry_interval_ms {
            return Err(invalid(
                "retry_interval_ms must not exceed max_retry_interval_ms",
            ));
        }

        if self.lock_stale_minutes == 0 {
            return Err(invalid("lock_stale_minutes must be greater than 0"));
        }

        if self.max_read_attempts == 0 {
            return Err(invalid("max_read_attempts must be greater than 0"));
        }
        if self.max_write_attempts == 0 {
            return Err(invalid("max_write_attempts must be greater than 0"));
        }

        Ok(())
    }

    /// The wait policy described by the lock settings.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: self.lock_timeout_ms.map(Duration::from_millis),
            initial_interval: Duration::from_millis(self.retry_interval_ms),
            max_interval: Duration::from_millis(self.max_retry_interval_ms),
        }
    }
}

fn invalid(message: &str) -> SyncError {
    SyncError::UserError(format!("config validation failed: {}", message))
}
