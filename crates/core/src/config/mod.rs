//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HOARDCACHE_*)
//! 2. TOML config file (if HOARDCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::SchemaRevision;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HOARDCACHE_*)
/// 2. TOML config file (if HOARDCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via HOARDCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Schema revision to migrate the cache table to (1-3).
    ///
    /// Older revisions exist for compatibility with databases shared with
    /// older bot builds. Set via HOARDCACHE_SCHEMA_REVISION.
    #[serde(default)]
    pub schema_revision: SchemaRevision,

    /// How long a writer waits on a locked database, in milliseconds.
    ///
    /// Set via HOARDCACHE_BUSY_TIMEOUT_MS environment variable.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./hoardcache.sqlite")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            schema_revision: SchemaRevision::LATEST,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Busy timeout as Duration for the SQLite connection.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HOARDCACHE_`
    /// 2. TOML file from `HOARDCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed, including a
    ///   `schema_revision` other than 1, 2 or 3
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HOARDCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HOARDCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./hoardcache.sqlite"));
        assert_eq!(config.schema_revision, SchemaRevision::Unconstrained);
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_busy_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.busy_timeout(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("hoardcache.toml", "db_path = \"/tmp/from-file.sqlite\"\nschema_revision = 1")?;
            jail.set_env("HOARDCACHE_CONFIG_FILE", "hoardcache.toml");
            jail.set_env("HOARDCACHE_SCHEMA_REVISION", "2");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.db_path, PathBuf::from("/tmp/from-file.sqlite"));
            assert_eq!(config.schema_revision, SchemaRevision::UniqueRepresentation);
            assert_eq!(config.busy_timeout_ms, 5_000);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_unknown_revision() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HOARDCACHE_SCHEMA_REVISION", "7");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::LoadFailed(msg)) if msg.contains("unknown schema revision 7")));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_unknown_revision_in_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("hoardcache.toml", "schema_revision = 0")?;
            jail.set_env("HOARDCACHE_CONFIG_FILE", "hoardcache.toml");
            assert!(matches!(AppConfig::load(), Err(ConfigError::LoadFailed(_))));
            Ok(())
        });
    }

    #[test]
    fn test_load_pinned_revision_from_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("hoardcache.toml", "schema_revision = 1")?;
            jail.set_env("HOARDCACHE_CONFIG_FILE", "hoardcache.toml");
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.schema_revision, SchemaRevision::UniquePost);
            Ok(())
        });
    }
}
