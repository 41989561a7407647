//! cache_stats tool implementation.

use hoardcache_core::{Error, MediaCache};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    /// Schema revision of the cache table.
    pub revision: i64,
    /// Number of cached rows.
    pub entries: u64,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(cache: &MediaCache) -> Result<CallToolResult, McpError> {
    let output = CacheStatsOutput {
        revision: cache.store().revision().version(),
        entries: cache.store().count_entries().await?,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoardcache_core::{CacheDb, SchemaRevision, UploadedMedia};

    #[tokio::test]
    async fn test_stats_impl() {
        let cache = MediaCache::new(CacheDb::open_in_memory_at(SchemaRevision::UniquePost).await.unwrap());
        cache
            .insert(UploadedMedia {
                post_id: 1,
                is_photo: true,
                media_id: 2,
                access_hash: 3,
                file_url: None,
                mime_type: None,
                is_thumbnail: false,
                sent_as_file: None,
            })
            .await
            .unwrap();

        let result = stats_impl(&cache).await.unwrap();
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        let output: CacheStatsOutput = serde_json::from_str(text).unwrap();
        assert_eq!(output.revision, 1);
        assert_eq!(output.entries, 1);
    }
}
