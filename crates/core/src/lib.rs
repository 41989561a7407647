//! Core types and shared functionality for hoardcache.
//!
//! This crate provides:
//! - The `cache_entries` store with SQLite backend and schema revisions
//! - The delivery-side media cache built on it
//! - Unified error types
//! - Configuration structures
//! - Prometheus metrics

pub mod cache;
pub mod config;
pub mod error;
pub mod media;
pub mod metrics;

pub use cache::{CacheDb, CacheEntry, SchemaRevision};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use media::{MediaCache, UploadedMedia};
