//! cache_metrics tool implementation.

use hoardcache_core::metrics;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};

/// Implementation of the cache_metrics tool.
///
/// Returns the Prometheus text exposition of every registered metric.
pub async fn metrics_impl() -> Result<CallToolResult, McpError> {
    metrics::register_metrics();
    let text = metrics::render()?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoardcache_core::{CacheDb, MediaCache, UploadedMedia};

    #[tokio::test]
    async fn test_metrics_impl_reports_entries_gauge() {
        let cache = MediaCache::new(CacheDb::open_in_memory().await.unwrap());
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

        let result = metrics_impl().await.unwrap();
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        assert!(text.contains("# TYPE hoardcache_db_cache_entries gauge"));
    }
}
