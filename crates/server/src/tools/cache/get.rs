//! cache_lookup and cache_entries tool implementations.
//!
//! Retrieves cached media for a post.

use hoardcache_core::{CacheEntry, Error, MediaCache};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheLookupParams {
    /// Source post identifier.
    pub post_id: i64,

    /// Look up the photo representation (true) or the document one (false).
    pub is_photo: bool,

    /// Allow thumbnail entries, for inline previews.
    #[serde(default)]
    pub allow_inline: bool,
}

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Source post identifier.
    pub post_id: i64,
}

/// Output from the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheLookupOutput {
    /// The entry to deliver.
    pub entry: CacheEntry,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    /// Every row cached for the post, oldest first.
    pub entries: Vec<CacheEntry>,
}

/// Implementation of the cache_lookup tool.
pub async fn lookup_impl(cache: &MediaCache, params: CacheLookupParams) -> Result<CallToolResult, McpError> {
    let entry = cache
        .load(params.post_id, params.is_photo, params.allow_inline)
        .await?
        .ok_or_else(|| Error::NotFound(format!("post {} (is_photo={})", params.post_id, params.is_photo)))?;

    let output = CacheLookupOutput { entry };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(cache: &MediaCache, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    let entries = cache.store().entries_for_post(params.post_id).await?;

    let output = CacheEntriesOutput { entries };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entries: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
