//! cache_insert tool implementation.
//!
//! Records an upload, either strictly (duplicates rejected where the schema
//! enforces uniqueness) or as a replacing save.

use hoardcache_core::{CacheEntry, Error, MediaCache, UploadedMedia};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_insert tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInsertParams {
    /// The uploaded media to record.
    #[serde(flatten)]
    pub media: UploadedMedia,

    /// Replace rows with the same key instead of failing on them.
    #[serde(default)]
    pub replace: bool,
}

/// Output from the cache_insert tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInsertOutput {
    /// The stored entry, with its cache date.
    pub entry: CacheEntry,
}

/// Implementation of the cache_insert tool.
pub async fn insert_impl(cache: &MediaCache, params: CacheInsertParams) -> Result<CallToolResult, McpError> {
    let entry = if params.replace { cache.save(params.media).await? } else { cache.insert(params.media).await? };

    let output = CacheInsertOutput { entry };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
