//! SQLite-backed store of uploaded media, keyed by source post.
//!
//! This module provides the persistent `cache_entries` table using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Three schema revisions with forward-only migrations
//! - Insert, replace-on-resave and point lookups
//! - WAL mode for concurrent readers

pub mod connection;
pub mod entries;
pub mod migrations;
pub mod revision;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use revision::SchemaRevision;
