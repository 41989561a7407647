//! MCP tool implementations.
//!
//! This module contains all tools exposed by the hoardcache server.

pub mod cache;
