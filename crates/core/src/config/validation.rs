//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::cache::SchemaRevision;
use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `busy_timeout_ms` is less than 100ms or exceeds 1 minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if self.schema_revision < SchemaRevision::LATEST {
            tracing::warn!(
                revision = self.schema_revision.version(),
                "cache pinned below the latest schema revision; uniqueness is enforced by the database"
            );
        }

        if self.busy_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "busy_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.busy_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "busy_timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        Ok(())
    }
}
