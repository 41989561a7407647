//! Cache-related MCP tools.
//!
//! This module provides tools for interacting with the SQLite media cache.

pub mod get;
pub mod insert;
pub mod metrics;
pub mod stats;

pub use get::{CacheEntriesParams, CacheLookupParams, entries_impl, lookup_impl};
pub use insert::{CacheInsertParams, insert_impl};
pub use metrics::metrics_impl;
pub use stats::stats_impl;
